//! Writes through the external [`ddcutil`](https://www.ddcutil.com/) tool.
//!
//! ddcutil numbers displays from 1 in the order of `ddcutil detect`, and keys
//! them by DRM connector rather than by X output, so primary display lookup
//! correlates the two by name.

use {
    super::Transport,
    crate::{BackendKind, Error, PrimaryDisplay, VcpWrite},
    log::{debug, warn},
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
        process::{Command, Stdio},
    },
};

/// The ddcutil backend.
#[derive(Clone, Debug)]
pub struct Ddcutil {
    program: PathBuf,
}

impl Ddcutil {
    /// Use `program` without checking that it exists.
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check that `program --version` runs successfully.
    pub fn probe<P: AsRef<Path>>(program: P) -> Result<Self, Error> {
        let ddcutil = Self::new(program.as_ref());
        let status = Command::new(&ddcutil.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::unavailable(BackendKind::Ddcutil.name(), e))?;

        match status.success() {
            true => Ok(ddcutil),
            false => Err(Error::unavailable(
                BackendKind::Ddcutil.name(),
                format!("{} --version exited with {status}", ddcutil.program.display()),
            )),
        }
    }

    /// Arguments for a single `setvcp` invocation.
    ///
    /// Standard writes use ddcutil's own `setvcp`. Vendor registers replace the
    /// I2C source address, and skip verification and feature checks since both
    /// assume the standard sub-address.
    pub fn setvcp_args(display: usize, vcp: &VcpWrite) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-d".into(), (display + 1).to_string().into(), "setvcp".into()];
        args.push(format!("x{:02X}", vcp.code).into());
        match vcp.is_standard() {
            true => args.push(format!("x{:02X}", vcp.value).into()),
            false => {
                args.push(format!("x00{:02X}", vcp.value).into());
                args.push(format!("--i2c-source-addr=x{:02X}", vcp.sub_address).into());
                args.push("--noverify".into());
                args.push("--permit-unknown-feature".into());
            },
        }
        args
    }

    /// Find the 1-based ddcutil display whose detect section mentions `output`.
    ///
    /// Several sections can match (e.g. `HDMI-1` is a substring of
    /// `card1-HDMI-1` too); the first one wins. Sections ddcutil reports as
    /// invalid are never matched.
    pub fn correlate(detect: &str, output: &str) -> Option<u32> {
        if output.is_empty() {
            return None
        }

        let mut current = 0;
        for line in detect.lines() {
            if let Some(rest) = line.strip_prefix("Display ") {
                current = rest.trim().parse().unwrap_or(0);
            } else if !line.is_empty() && !line.starts_with(char::is_whitespace) {
                // "Invalid display" and other sections ddcutil can't address
                current = 0;
            }
            if current > 0 && line.contains(output) {
                return Some(current)
            }
        }

        None
    }

    fn detect(&self) -> Option<String> {
        match Command::new(&self.program)
            .arg("detect")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
        {
            Ok(output) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            Err(e) => {
                warn!("Failed to run {} detect: {e}", self.program.display());
                None
            },
        }
    }
}

impl Transport for Ddcutil {
    fn name(&self) -> &'static str {
        BackendKind::Ddcutil.name()
    }

    fn locate_primary(&mut self, primary: &PrimaryDisplay) -> Option<usize> {
        let detect = self.detect()?;
        Self::correlate(&detect, &primary.name).map(|display| display as usize - 1)
    }

    fn write(&mut self, display: usize, vcp: &VcpWrite) -> Result<(), Error> {
        let args = Self::setvcp_args(display, vcp);
        debug!("{} {:?}", self.program.display(), args);

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| Error::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        match status.success() {
            true => Ok(()),
            false => Err(Error::ToolStatus {
                program: self.program.display().to_string(),
                status: status.code().unwrap_or(-1),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::SUB_ADDRESS_LG};

    const DETECT: &str = "\
Display 1
   I2C bus:  /dev/i2c-4
   DRM connector:           card0-DP-1
   EDID synopsis:
      Mfg id:               DEL - Dell Inc.
      Model:                DELL U2720Q
   VCP version:         2.1

Display 2
   I2C bus:  /dev/i2c-6
   DRM connector:           card0-HDMI-A-1
   EDID synopsis:
      Mfg id:               GSM - Goldstar Company Ltd
      Model:                LG ULTRAGEAR
   VCP version:         2.1

Invalid display
   I2C bus:  /dev/i2c-7
   DRM connector:           card0-DP-2
";

    fn args(display: usize, vcp: VcpWrite) -> Vec<String> {
        Ddcutil::setvcp_args(display, &vcp)
            .into_iter()
            .map(|arg| arg.into_string().unwrap())
            .collect()
    }

    #[test]
    fn standard_setvcp() {
        assert_eq!(args(0, VcpWrite::new(0x60, 0x0c)), ["-d", "1", "setvcp", "x60", "x0C"]);
    }

    #[test]
    fn vendor_register_setvcp() {
        let vcp = VcpWrite::with_sub_address(0x70, 0x01, SUB_ADDRESS_LG);
        assert_eq!(args(1, vcp), [
            "-d",
            "2",
            "setvcp",
            "x70",
            "x0001",
            "--i2c-source-addr=x50",
            "--noverify",
            "--permit-unknown-feature",
        ]);
    }

    #[test]
    fn correlate_connector() {
        assert_eq!(Ddcutil::correlate(DETECT, "DP-1"), Some(1));
        assert_eq!(Ddcutil::correlate(DETECT, "HDMI-A-1"), Some(2));
    }

    #[test]
    fn correlate_first_match_wins() {
        assert_eq!(Ddcutil::correlate(DETECT, "card0"), Some(1));
    }

    #[test]
    fn correlate_no_match() {
        assert_eq!(Ddcutil::correlate(DETECT, "HDMI-1"), None);
        assert_eq!(Ddcutil::correlate(DETECT, "DP-2"), None);
        assert_eq!(Ddcutil::correlate(DETECT, ""), None);
        assert_eq!(Ddcutil::correlate("", "DP-1"), None);
    }

    #[cfg(unix)]
    #[test]
    fn write_succeeds() {
        let mut ddcutil = Ddcutil::new("true");
        assert!(ddcutil.write(0, &VcpWrite::new(0x60, 0x0c)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn rejected_write_reports_status() {
        let mut ddcutil = Ddcutil::new("false");
        match ddcutil.write(0, &VcpWrite::new(0x60, 0x0c)) {
            Err(Error::ToolStatus { program, status }) => {
                assert_eq!(program, "false");
                assert_eq!(status, 1);
            },
            res => panic!("unexpected result {res:?}"),
        }
    }

    #[test]
    fn missing_program() {
        assert!(matches!(
            Ddcutil::probe("/nonexistent/ddcutil"),
            Err(Error::Unavailable { backend: "ddcutil", .. })
        ));

        let mut ddcutil = Ddcutil::new("/nonexistent/ddcutil");
        let primary = PrimaryDisplay {
            name: "DP-1".into(),
            index: None,
        };
        assert_eq!(ddcutil.locate_primary(&primary), None);
        assert!(matches!(
            ddcutil.write(0, &VcpWrite::new(0x10, 0x32)),
            Err(Error::Spawn { .. })
        ));
    }
}
