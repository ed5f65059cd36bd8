pub mod setout {
    pub const ADDR: u8 = 0x00;

    pub const fn out(ch: u8) -> u8 {
        1 << ch
    }

    /// Set for input, clear for output.
    pub const fn dir(ch: u8) -> u8 {
        1 << (ch + 4)
    }
}

pub mod setled {
    pub const ADDR: u8 = 0x01;

    pub const fn sled(ch: u8) -> u8 {
        1 << (ch + 4)
    }
}

pub mod doilevel {
    pub const ADDR: u8 = 0x02;

    pub const fn level(ch: u8) -> u8 {
        1 << ch
    }
}

pub mod interrupt {
    pub const ADDR: u8 = 0x03;
}

pub mod opn_wir_flt {
    pub const ADDR: u8 = 0x05;
}

pub mod shd_vdd_flt {
    pub const ADDR: u8 = 0x06;
}

pub mod global_flt {
    pub const ADDR: u8 = 0x07;
}

pub mod config1 {
    pub const ADDR: u8 = 0x0A;
    pub const SLED: u8 = 1 << 1;
}

pub mod config_do {
    pub const ADDR: u8 = 0x0D;
    pub const HIGH_SIDE: u8 = 0x00;
    pub const HIGH_SIDE_INRUSH: u8 = 0x01;
    pub const PUSH_PULL_CLAMP: u8 = 0x02;
    pub const PUSH_PULL: u8 = 0x03;

    pub const fn mode(ch: u8) -> u8 {
        0x03 << (2 * ch)
    }
}

pub mod curr_lim {
    pub const ADDR: u8 = 0x0E;

    pub const fn cl(ch: u8) -> u8 {
        0x03 << (2 * ch)
    }
}

pub const MAX_ADDR: u8 = 0x0F;
