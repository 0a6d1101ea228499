use {
    clap::Parser,
    ddc_write::{BackendKind, Config, DisplaySelector, VcpWrite, WriteRequest, SUB_ADDRESS_DDC_CI},
    std::path::PathBuf,
};

/// Printed after any argument error.
pub const USAGE: &str = "\
Arguments:
display_index    - Index assigned to monitor (0 for first screen, -1 for primary)
input_value      - value to write to screen (hex)
command_code     - VCP code or other (hex)
register_address - Address to write to, default 0x51 for VCP codes (hex)

Usage:
ddc-write [display_index] [input_value] [command_code]
OR
ddc-write [display_index] [input_value] [command_code] [register_address]
";

/// Write a single DDC/CI VCP value to a monitor.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Index assigned to the monitor (0 for the first screen, -1 for primary)
    #[arg(allow_negative_numbers = true, value_parser = clap::value_parser!(i32).range(-1..))]
    pub display_index: i32,

    /// Value to write to the screen (hex)
    #[arg(value_parser = parse_hex_byte)]
    pub input_value: u8,

    /// VCP code or other command (hex)
    #[arg(value_parser = parse_hex_byte)]
    pub command_code: u8,

    /// Register address to write to (hex), default 0x51 for VCP codes
    #[arg(value_parser = parse_hex_byte)]
    pub register_address: Option<u8>,

    /// Only try this backend
    #[arg(long, value_enum, env = "DDC_WRITE_BACKEND")]
    pub backend: Option<BackendKind>,

    /// ddcutil executable
    #[arg(long, env = "DDCUTIL", default_value = "ddcutil")]
    pub ddcutil: PathBuf,

    /// xrandr executable, used to find the primary display
    #[arg(long, env = "XRANDR", default_value = "xrandr")]
    pub xrandr: PathBuf,
}

impl Cli {
    pub fn request(&self) -> WriteRequest {
        let display = match DisplaySelector::from_arg(self.display_index) {
            Some(display) => display,
            // the value parser rejects everything below -1
            None => DisplaySelector::Primary,
        };
        let sub_address = self.register_address.unwrap_or(SUB_ADDRESS_DDC_CI);
        WriteRequest {
            display,
            vcp: VcpWrite::with_sub_address(self.command_code, self.input_value, sub_address),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            backend: self.backend,
            ddcutil: self.ddcutil.clone(),
            xrandr: self.xrandr.clone(),
        }
    }
}

/// Parse a single hex byte, with or without a `0x` or `x` prefix.
pub fn parse_hex_byte(s: &str) -> Result<u8, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('x'))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).map_err(|e| format!("`{s}` is not a hex byte: {e}"))
}

#[cfg(test)]
mod tests {
    use {super::*, clap::error::ErrorKind, ddc_write::SUB_ADDRESS_LG};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("ddc-write").chain(args.iter().copied()))
    }

    #[test]
    fn hex_bytes() {
        assert_eq!(parse_hex_byte("0x0f"), Ok(0x0f));
        assert_eq!(parse_hex_byte("0XF4"), Ok(0xf4));
        assert_eq!(parse_hex_byte("x60"), Ok(0x60));
        assert_eq!(parse_hex_byte("60"), Ok(0x60));
        assert!(parse_hex_byte("").is_err());
        assert!(parse_hex_byte("0x").is_err());
        assert!(parse_hex_byte("zz").is_err());
        assert!(parse_hex_byte("0x100").is_err());
    }

    #[test]
    fn too_few_arguments() {
        let err = parse(&["0", "0x0f"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn too_many_arguments() {
        assert!(parse(&["0", "0f", "60", "50", "51"]).is_err());
    }

    #[test]
    fn standard_write() {
        let cli = parse(&["1", "0x0f", "0x60"]).unwrap();
        let request = cli.request();
        assert_eq!(request.display, DisplaySelector::Index(1));
        assert_eq!(request.vcp, VcpWrite::new(0x60, 0x0f));
        assert!(request.vcp.is_standard());
    }

    #[test]
    fn custom_register() {
        let cli = parse(&["0", "0x01", "0x70", "0x50"]).unwrap();
        let vcp = cli.request().vcp;
        assert_eq!(vcp.sub_address, SUB_ADDRESS_LG);
        assert!(!vcp.is_standard());

        let cli = parse(&["0", "0x0f", "0x60", "51"]).unwrap();
        assert!(cli.request().vcp.is_standard());
    }

    #[test]
    fn primary_display() {
        let cli = parse(&["-1", "11", "60"]).unwrap();
        assert_eq!(cli.request().display, DisplaySelector::Primary);
        assert!(parse(&["-2", "11", "60"]).is_err());
    }

    #[test]
    fn config_options() {
        let cli = parse(&["--backend", "ddcutil", "--ddcutil", "/opt/ddcutil", "0", "11", "60"]).unwrap();
        let config = cli.config();
        assert_eq!(config.backend, Some(BackendKind::Ddcutil));
        assert_eq!(config.ddcutil, PathBuf::from("/opt/ddcutil"));
    }
}
