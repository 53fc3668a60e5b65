//! Diagnostic snapshot of the broker's bookkeeping

use std::fmt;

use crate::{buffers::BufferDescription, sync::BufferId};

/// One active buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferReportRow {
    pub id: BufferId,
    /// Live clients referencing the buffer, always at least 1
    pub clients: u32,
    pub description: BufferDescription,
    pub state: u32,
    pub queue_index: u64,
}

/// Outstanding tokens of one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenReportRow {
    pub buffer_id: BufferId,
    pub tokens: u32,
}

/// Read-only view of active buffers and unused tokens, ordered by buffer id.
///
/// `Display` renders the stable two-table text format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerReport {
    pub buffers: Vec<BufferReportRow>,
    pub tokens: Vec<TokenReportRow>,
}

impl BrokerReport {
    /// Row for buffer `id`, if it has live clients
    pub fn buffer(&self, id: BufferId) -> Option<&BufferReportRow> {
        self.buffers.iter().find(|row| row.id == id)
    }

    /// Outstanding tokens for buffer `id`
    pub fn tokens_for(&self, id: BufferId) -> u32 {
        self.tokens
            .iter()
            .find(|row| row.buffer_id == id)
            .map_or(0, |row| row.tokens)
    }

    /// Live clients across every buffer
    pub fn total_clients(&self) -> u32 {
        self.buffers.iter().map(|row| row.clients).sum()
    }
}

impl fmt::Display for BrokerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Active Buffers:")?;
        writeln!(
            f,
            "{:>6} {:>9} {:>14} {:>6} {:>10} {:>10} {:>10}",
            "Id", "Clients", "Geometry", "Format", "Usage", "State", "Index"
        )?;
        for row in &self.buffers {
            writeln!(
                f,
                "{:>6} {:>9} {:>14} {:>6} 0x{:08x} 0x{:08x} {:08x}",
                row.id,
                row.clients,
                row.description.geometry(),
                row.description.format.code(),
                row.description.usage.bits(),
                row.state,
                row.queue_index
            )?;
        }

        writeln!(f)?;

        writeln!(f, "Unused Tokens:")?;
        writeln!(f, "{:>8} {:>6}", "Buffer Id", "Tokens")?;
        for row in &self.tokens {
            writeln!(f, "{:>8} {:>6}", row.buffer_id, row.tokens)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::{BufferUsage, PixelFormat};

    fn sample() -> BrokerReport {
        BrokerReport {
            buffers: vec![
                BufferReportRow {
                    id: 1,
                    clients: 2,
                    description: BufferDescription::new(64, 64, 1, PixelFormat::RGBA_8888, BufferUsage::CPU_READ_OFTEN),
                    state: 0,
                    queue_index: 0,
                },
                BufferReportRow {
                    id: 12,
                    clients: 1,
                    description: BufferDescription::blob(4096, BufferUsage::from_raw(0x1_0000_0030)),
                    state: 0x8000_0001,
                    queue_index: 255,
                },
            ],
            tokens: vec![TokenReportRow { buffer_id: 12, tokens: 3 }],
        }
    }

    #[test]
    fn test_text_format() {
        let expected = "\
Active Buffers:
    Id   Clients       Geometry Format      Usage      State      Index
     1         2        64x64x1      1 0x00000003 0x00000000 00000000
    12         1         4096 B     33 0x100000030 0x80000001 000000ff

Unused Tokens:
Buffer Id Tokens
      12      3
";
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn test_lookups() {
        let report = sample();
        assert_eq!(report.buffer(12).unwrap().clients, 1);
        assert!(report.buffer(2).is_none());
        assert_eq!(report.tokens_for(12), 3);
        assert_eq!(report.tokens_for(1), 0);
        assert_eq!(report.total_clients(), 3);
    }

    #[test]
    fn test_empty_report() {
        let text = BrokerReport::default().to_string();
        assert!(text.starts_with("Active Buffers:\n"));
        assert!(text.ends_with("Buffer Id Tokens\n"));
    }
}
