use {
    log::{debug, warn},
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        process::{Command, Stdio},
    },
};

/// The output the operating system reports as primary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrimaryDisplay {
    /// Output or device name, e.g. `HDMI-1` or `\\.\DISPLAY1`
    pub name: String,
    /// Position in the OS enumeration, when the OS reports one
    pub index: Option<usize>,
}

impl Display for PrimaryDisplay {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.name, f)
    }
}

/// Something that can name the primary display.
pub trait PrimarySource {
    /// Look up the primary display, if any is flagged.
    fn primary(&self) -> Option<PrimaryDisplay>;
}

/// Primary output lookup through `xrandr`.
#[derive(Clone, Debug)]
pub struct Xrandr {
    program: PathBuf,
}

impl Xrandr {
    /// Use the given `xrandr` executable.
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Extract the primary output name from `xrandr` output.
    ///
    /// The first line marked ` connected primary` wins.
    pub fn parse_primary(output: &str) -> Option<&str> {
        output
            .lines()
            .find(|line| line.contains(" connected primary"))
            .and_then(|line| line.split_whitespace().next())
    }
}

impl Default for Xrandr {
    fn default() -> Self {
        Self::new("xrandr")
    }
}

impl PrimarySource for Xrandr {
    fn primary(&self) -> Option<PrimaryDisplay> {
        let output = match Command::new(&self.program).stderr(Stdio::null()).output() {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run {}: {e}", self.program.display());
                return None
            },
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("{} reported {} lines", self.program.display(), stdout.lines().count());

        Self::parse_primary(&stdout).map(|name| PrimaryDisplay {
            name: name.into(),
            index: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XRANDR: &str = "\
Screen 0: minimum 320 x 200, current 4480 x 1440, maximum 16384 x 16384
DP-1 connected 1920x1080+2560+0 (normal left inverted right x axis y axis) 527mm x 296mm
   1920x1080     60.00*+
HDMI-1 connected primary 2560x1440+0+0 (normal left inverted right x axis y axis) 597mm x 336mm
   2560x1440     59.95*+
DP-2 disconnected (normal left inverted right x axis y axis)
";

    #[test]
    fn finds_primary_output() {
        assert_eq!(Xrandr::parse_primary(XRANDR), Some("HDMI-1"));
    }

    #[test]
    fn no_primary_output() {
        let output = "DP-1 connected 1920x1080+0+0\nDP-2 disconnected\n";
        assert_eq!(Xrandr::parse_primary(output), None);
        assert_eq!(Xrandr::parse_primary(""), None);
    }

    #[test]
    fn missing_program_is_not_fatal() {
        let xrandr = Xrandr::new("/nonexistent/xrandr");
        assert_eq!(xrandr.primary(), None);
    }
}
