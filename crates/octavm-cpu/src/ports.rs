//! Memory-mapped I/O ports.
//!
//! A [`Port`] is a pair of optional synchronous callables, exactly as
//! spec describes: "a (read, write) pair of optional operations indexed
//! by one-byte address." [`PortTable`] is the fixed three-entry table
//! the CPU dispatches `IN`/`OUT` through; it never grows or shrinks at
//! runtime, matching the design note that dynamic port registration is
//! not required.

use crate::error::CpuError;

/// A single memory-mapped I/O port.
///
/// Either side may be absent. Reading an unreadable port or writing an
/// unwritable one is the caller's responsibility to reject — [`PortTable`]
/// does that centrally so individual ports stay simple callables.
pub struct Port<'a> {
    read: Option<Box<dyn FnMut() -> u8 + 'a>>,
    write: Option<Box<dyn FnMut(u8) + 'a>>,
}

impl<'a> Port<'a> {
    /// Build a port from its optional read and write sides.
    #[must_use]
    pub fn new(
        read: Option<Box<dyn FnMut() -> u8 + 'a>>,
        write: Option<Box<dyn FnMut(u8) + 'a>>,
    ) -> Self {
        Self { read, write }
    }

    /// A port with neither side implemented (a pure no-op stub).
    #[must_use]
    pub fn stub() -> Self {
        Self::new(Some(Box::new(|| 0)), Some(Box::new(|_| {})))
    }

    /// A port that only supports reads.
    #[must_use]
    pub fn read_only(read: impl FnMut() -> u8 + 'a) -> Self {
        Self::new(Some(Box::new(read)), None)
    }

    /// A port that only supports writes.
    #[must_use]
    pub fn write_only(write: impl FnMut(u8) + 'a) -> Self {
        Self::new(None, Some(Box::new(write)))
    }

    fn do_read(&mut self) -> Option<u8> {
        self.read.as_mut().map(|read| read())
    }

    fn do_write(&mut self, value: u8) -> bool {
        match self.write.as_mut() {
            Some(write) => {
                write(value);
                true
            }
            None => false,
        }
    }
}

/// The CPU's I/O port table.
///
/// Populated with exactly the three entries spec's data model requires:
/// control at `0x00`, data-in at `0x01`, data-out at `0x02`. Any other
/// port address is an [`CpuError::UnknownPort`].
pub struct PortTable<'a> {
    slots: [Port<'a>; 3],
}

impl<'a> PortTable<'a> {
    /// Port address of the terminal control port.
    pub const CONTROL: u8 = 0x00;
    /// Port address of the terminal data-in port.
    pub const DATA_IN: u8 = 0x01;
    /// Port address of the terminal data-out port.
    pub const DATA_OUT: u8 = 0x02;

    /// Build the table from its three required ports.
    #[must_use]
    pub fn new(control: Port<'a>, data_in: Port<'a>, data_out: Port<'a>) -> Self {
        Self {
            slots: [control, data_in, data_out],
        }
    }

    fn slot(&mut self, address: u8) -> Result<&mut Port<'a>, CpuError> {
        match address {
            Self::CONTROL | Self::DATA_IN | Self::DATA_OUT => {
                Ok(&mut self.slots[address as usize])
            }
            other => Err(CpuError::UnknownPort { port: other }),
        }
    }

    /// Read one byte from `address`, per `IN`'s semantics.
    pub fn read(&mut self, address: u8) -> Result<u8, CpuError> {
        let port = self.slot(address)?;
        port.do_read().ok_or(CpuError::PortDirectionMismatch {
            port: address,
            direction: "reads",
        })
    }

    /// Write one byte to `address`, per `OUT`'s semantics.
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), CpuError> {
        let port = self.slot(address)?;
        if port.do_write(value) {
            Ok(())
        } else {
            Err(CpuError::PortDirectionMismatch {
                port: address,
                direction: "writes",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn control_port_is_readable_and_writable_as_a_no_op() {
        let mut table = PortTable::new(Port::stub(), Port::read_only(|| 0), Port::write_only(|_| {}));
        assert_eq!(table.read(PortTable::CONTROL).unwrap(), 0);
        table.write(PortTable::CONTROL, 0xAB).unwrap();
    }

    #[test]
    fn data_in_rejects_writes() {
        let mut table = PortTable::new(Port::stub(), Port::read_only(|| 0x42), Port::write_only(|_| {}));
        assert_eq!(table.read(PortTable::DATA_IN).unwrap(), 0x42);
        let err = table.write(PortTable::DATA_IN, 0x01).unwrap_err();
        assert!(matches!(err, CpuError::PortDirectionMismatch { port: 0x01, .. }));
    }

    #[test]
    fn data_out_rejects_reads() {
        let written = Rc::new(Cell::new(0u8));
        let written_clone = Rc::clone(&written);
        let mut table = PortTable::new(
            Port::stub(),
            Port::read_only(|| 0),
            Port::write_only(move |v| written_clone.set(v)),
        );
        table.write(PortTable::DATA_OUT, 0x7F).unwrap();
        assert_eq!(written.get(), 0x7F);
        let err = table.read(PortTable::DATA_OUT).unwrap_err();
        assert!(matches!(err, CpuError::PortDirectionMismatch { port: 0x02, .. }));
    }

    #[test]
    fn unknown_port_is_rejected() {
        let mut table = PortTable::new(Port::stub(), Port::read_only(|| 0), Port::write_only(|_| {}));
        let err = table.read(0x10).unwrap_err();
        assert!(matches!(err, CpuError::UnknownPort { port: 0x10 }));
    }
}
