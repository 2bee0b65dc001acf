use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL1: Register<0x20, u8> = 0x00;
        static CTRL2: Register<0x20, u8> = 0x00;
    }
});

fn main() {}
