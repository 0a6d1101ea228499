use {
    crate::{resolve, DisplaySelector, Error, PrimarySource, Transport, VcpWrite},
    log::debug,
};

/// A complete write request: which display, and what to write to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WriteRequest {
    /// Target display
    pub display: DisplaySelector,
    /// The VCP write itself
    pub vcp: VcpWrite,
}

impl WriteRequest {
    /// Resolve the target display and issue the write through `transport`.
    ///
    /// The write is attempted exactly once. Returns the display index it was
    /// sent to.
    pub fn execute<T, S>(&self, transport: &mut T, source: &S) -> Result<usize, Error>
    where
        T: Transport + ?Sized,
        S: PrimarySource + ?Sized,
    {
        let index = resolve(self.display, transport, source);
        debug!("Display {} <- {:?}", index, self.vcp.packet());
        transport.write(index, &self.vcp)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::PrimaryDisplay};

    #[derive(Default)]
    struct Recorder {
        writes: Vec<(usize, VcpWrite)>,
        fail: bool,
    }

    impl Transport for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn write(&mut self, display: usize, vcp: &VcpWrite) -> Result<(), Error> {
            self.writes.push((display, *vcp));
            match self.fail {
                true => Err(Error::Status {
                    call: "recorder",
                    status: -5,
                }),
                false => Ok(()),
            }
        }
    }

    struct Second;

    impl PrimarySource for Second {
        fn primary(&self) -> Option<PrimaryDisplay> {
            Some(PrimaryDisplay {
                name: "DP-1".into(),
                index: Some(1),
            })
        }
    }

    #[test]
    fn writes_to_indexed_display() {
        let mut transport = Recorder::default();
        let request = WriteRequest {
            display: DisplaySelector::Index(2),
            vcp: VcpWrite::new(0x60, 0x0f),
        };
        assert_eq!(request.execute(&mut transport, &Second).unwrap(), 2);
        assert_eq!(transport.writes, [(2, request.vcp)]);
    }

    #[test]
    fn primary_is_resolved_first() {
        let mut transport = Recorder::default();
        let request = WriteRequest {
            display: DisplaySelector::Primary,
            vcp: VcpWrite::new(0x10, 0x32),
        };
        assert_eq!(request.execute(&mut transport, &Second).unwrap(), 1);
        assert_eq!(transport.writes.len(), 1);
        assert_eq!(transport.writes[0].0, 1);
    }

    #[test]
    fn failed_write_is_not_retried() {
        let mut transport = Recorder {
            fail: true,
            ..Default::default()
        };
        let request = WriteRequest {
            display: DisplaySelector::Index(0),
            vcp: VcpWrite::with_sub_address(0xf4, 0x90, crate::SUB_ADDRESS_LG),
        };
        assert!(matches!(
            request.execute(&mut transport, &Second),
            Err(Error::Status { status: -5, .. })
        ));
        assert_eq!(transport.writes.len(), 1);
    }
}
