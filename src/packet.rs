use {
    ddc::{FeatureCode, I2C_ADDRESS_DDC_CI, SUB_ADDRESS_DDC_CI},
    std::fmt::{self, Debug, Formatter},
};

/// 8-bit I2C write address of the DDC/CI device (`0x37 << 1`)
pub const I2C_WRITE_ADDRESS_DDC_CI: u8 = (I2C_ADDRESS_DDC_CI as u8) << 1;

/// Custom register used by LG monitors for proprietary features such as input switching
pub const SUB_ADDRESS_LG: u8 = 0x50;

/// DDC/CI "Set VCP Feature" opcode
pub const OPCODE_SET_VCP_FEATURE: u8 = 0x03;

const LENGTH_FLAG: u8 = 0x80;
const PACKET_LEN: usize = 8;

/// XOR-fold every byte of a DDC/CI message.
pub fn checksum<I: IntoIterator<Item = u8>>(iter: I) -> u8 {
    iter.into_iter().fold(0u8, |sum, v| sum ^ v)
}

/// A single VCP write as requested by the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VcpWrite {
    /// VCP feature code
    pub code: FeatureCode,
    /// Value to set
    pub value: u8,
    /// Register the command targets
    pub sub_address: u8,
}

impl VcpWrite {
    /// A write to the standard VCP sub-address.
    pub fn new(code: FeatureCode, value: u8) -> Self {
        Self::with_sub_address(code, value, SUB_ADDRESS_DDC_CI)
    }

    /// A write to an arbitrary register, such as [`SUB_ADDRESS_LG`].
    pub fn with_sub_address(code: FeatureCode, value: u8, sub_address: u8) -> Self {
        Self {
            code,
            value,
            sub_address,
        }
    }

    /// Whether this targets the standard VCP sub-address, and so can be
    /// issued through a backend's own "set VCP feature" primitive.
    pub fn is_standard(&self) -> bool {
        self.sub_address == SUB_ADDRESS_DDC_CI
    }

    /// Assemble the wire packet for this write.
    pub fn packet(&self) -> DdcPacket {
        DdcPacket::set_vcp_feature(self.code, self.value as u16, self.sub_address)
    }
}

/// A complete "Set VCP Feature" packet, checksum included.
///
/// Layout: `[0x6e, sub_address, 0x84, 0x03, code, value_hi, value_lo, checksum]`
///
/// The checksum covers every preceding byte including the device address.
/// Packets are immutable once built so the checksum can never go stale.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct DdcPacket {
    bytes: [u8; PACKET_LEN],
}

impl DdcPacket {
    /// Length of the packet on the wire
    pub const LEN: usize = PACKET_LEN;

    /// Build a "Set VCP Feature" packet.
    pub fn set_vcp_feature(code: FeatureCode, value: u16, sub_address: u8) -> Self {
        let data = [OPCODE_SET_VCP_FEATURE, code, (value >> 8) as u8, value as u8];

        let mut bytes = [0u8; Self::LEN];
        bytes[0] = I2C_WRITE_ADDRESS_DDC_CI;
        bytes[1] = sub_address;
        bytes[2] = LENGTH_FLAG | data.len() as u8;
        bytes[3..3 + data.len()].copy_from_slice(&data);
        bytes[Self::LEN - 1] = checksum(bytes[..Self::LEN - 1].iter().cloned());

        DdcPacket { bytes }
    }

    /// The full packet in transmission order.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.bytes
    }

    /// I2C write address the packet is sent to.
    pub fn device_address(&self) -> u8 {
        self.bytes[0]
    }

    /// Register the packet targets.
    pub fn sub_address(&self) -> u8 {
        self.bytes[1]
    }

    /// Everything after the sub-address: length, opcode, code, value and checksum.
    ///
    /// APIs that take the device and register address separately expect this block.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[2..]
    }

    /// The trailing checksum byte.
    pub fn checksum(&self) -> u8 {
        self.bytes[Self::LEN - 1]
    }

    /// Re-fold the packet and compare against the stored checksum.
    pub fn is_valid(&self) -> bool {
        checksum(self.bytes[..Self::LEN - 1].iter().cloned()) == self.checksum()
    }
}

impl Debug for DdcPacket {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "DdcPacket[")?;
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02x}")?;
        }
        write!(f, "]")
    }
}

impl AsRef<[u8]> for DdcPacket {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
