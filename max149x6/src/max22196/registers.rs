pub mod di_state {
    pub const ADDR: u8 = 0x00;

    pub const fn state(ch: u8) -> u8 {
        1 << ch
    }
}

pub mod fault1 {
    pub const ADDR: u8 = 0x01;
}

pub mod cfg {
    pub const BASE: u8 = 0x03;
    pub const HITHR: u8 = 1 << 7;
    pub const SOURCE: u8 = 1 << 6;
    pub const CURR_MASK: u8 = 0x03 << 4;
    pub const FLTEN: u8 = 1 << 3;
    pub const DELAY_MASK: u8 = 0x07;

    pub const fn addr(ch: u8) -> u8 {
        BASE + ch
    }
}

pub mod fault2 {
    pub const ADDR: u8 = 0x0D;
}

pub mod start_stop {
    pub const ADDR: u8 = 0x0F;

    pub const fn cnt(ch: u8) -> u8 {
        1 << ch
    }
}

pub mod cnt {
    pub const BASE: u8 = 0x10;

    pub const fn lsb(ch: u8) -> u8 {
        BASE + 2 * ch
    }

    pub const fn msb(ch: u8) -> u8 {
        BASE + 2 * ch + 1
    }
}

pub const MAX_ADDR: u8 = 0x1F;
