use {
    crate::{PrimarySource, Transport},
    log::{info, warn},
    std::fmt::{self, Display, Formatter},
};

/// Which display a write is aimed at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DisplaySelector {
    /// 0-based index in the active backend's enumeration order
    Index(usize),
    /// Whatever the operating system reports as the primary display
    Primary,
}

impl DisplaySelector {
    /// Interpret a command-line display index, where `-1` selects the primary
    /// display. Other negative values are rejected.
    pub fn from_arg(index: i32) -> Option<Self> {
        match index {
            -1 => Some(DisplaySelector::Primary),
            index => usize::try_from(index).ok().map(DisplaySelector::Index),
        }
    }
}

impl Display for DisplaySelector {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DisplaySelector::Index(index) => write!(f, "{index}"),
            DisplaySelector::Primary => f.write_str("primary"),
        }
    }
}

/// Map a selector to a 0-based index the transport understands.
///
/// Primary detection is best effort: whenever the OS lookup or the
/// transport's correlation comes up empty this logs a warning and falls back
/// to the first display, it never fails.
pub fn resolve<T: Transport + ?Sized, S: PrimarySource + ?Sized>(
    selector: DisplaySelector,
    transport: &mut T,
    source: &S,
) -> usize {
    let primary = match selector {
        DisplaySelector::Index(index) => return index,
        DisplaySelector::Primary => source.primary(),
    };

    let primary = match primary {
        Some(primary) => primary,
        None => {
            warn!("Primary display not found, defaulting to index 0");
            return 0
        },
    };
    info!("Primary display device found: {primary}");

    match transport.locate_primary(&primary) {
        Some(index) => {
            info!("Using display index {index} for primary display");
            index
        },
        None => {
            warn!("Could not map {primary} to a {} display, using index 0", transport.name());
            0
        },
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{Error, PrimaryDisplay, VcpWrite},
    };

    struct Source(Option<PrimaryDisplay>);

    impl PrimarySource for Source {
        fn primary(&self) -> Option<PrimaryDisplay> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Correlating {
        listing: Vec<&'static str>,
    }

    impl Transport for Correlating {
        fn name(&self) -> &'static str {
            "test"
        }

        fn locate_primary(&mut self, primary: &PrimaryDisplay) -> Option<usize> {
            self.listing.iter().position(|name| name.contains(&primary.name[..]))
        }

        fn write(&mut self, _display: usize, _vcp: &VcpWrite) -> Result<(), Error> {
            Ok(())
        }
    }

    struct OsOrdered;

    impl Transport for OsOrdered {
        fn name(&self) -> &'static str {
            "os"
        }

        fn write(&mut self, _display: usize, _vcp: &VcpWrite) -> Result<(), Error> {
            Ok(())
        }
    }

    fn primary(name: &str, index: Option<usize>) -> Source {
        Source(Some(PrimaryDisplay {
            name: name.into(),
            index,
        }))
    }

    #[test]
    fn selector_from_arg() {
        assert_eq!(DisplaySelector::from_arg(-1), Some(DisplaySelector::Primary));
        assert_eq!(DisplaySelector::from_arg(0), Some(DisplaySelector::Index(0)));
        assert_eq!(DisplaySelector::from_arg(3), Some(DisplaySelector::Index(3)));
        assert_eq!(DisplaySelector::from_arg(-2), None);
    }

    #[test]
    fn explicit_index_passes_through() {
        let mut transport = OsOrdered;
        let index = resolve(DisplaySelector::Index(2), &mut transport, &Source(None));
        assert_eq!(index, 2);
    }

    #[test]
    fn primary_uses_os_index() {
        let mut transport = OsOrdered;
        let index = resolve(DisplaySelector::Primary, &mut transport, &primary("\\\\.\\DISPLAY2", Some(1)));
        assert_eq!(index, 1);
    }

    #[test]
    fn primary_falls_back_without_os_primary() {
        let mut transport = OsOrdered;
        assert_eq!(resolve(DisplaySelector::Primary, &mut transport, &Source(None)), 0);
    }

    #[test]
    fn primary_falls_back_without_os_index() {
        let mut transport = OsOrdered;
        assert_eq!(resolve(DisplaySelector::Primary, &mut transport, &primary("HDMI-1", None)), 0);
    }

    #[test]
    fn primary_correlates_by_name() {
        let mut transport = Correlating {
            listing: vec!["card0-DP-1", "card0-HDMI-1", "card1-HDMI-1"],
        };
        assert_eq!(resolve(DisplaySelector::Primary, &mut transport, &primary("HDMI-1", None)), 1);
    }

    #[test]
    fn primary_falls_back_without_match() {
        let mut transport = Correlating {
            listing: vec!["card0-DP-1"],
        };
        assert_eq!(resolve(DisplaySelector::Primary, &mut transport, &primary("HDMI-1", None)), 0);

        let mut transport = Correlating::default();
        assert_eq!(resolve(DisplaySelector::Primary, &mut transport, &primary("HDMI-1", None)), 0);
    }
}
