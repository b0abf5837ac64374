//! Expansion of a bitrange and its repeat parameters into the physical
//! registers each field index occupies.
//!
//! Index `i` of a field array lives in logical register `i / field_repeat`
//! at lane `i % field_repeat`. Logical registers are `stride` bytes apart;
//! lanes are `field_stride` bits apart. A lane whose bits reach beyond the
//! bus width spills over into the next block(s): bit `b` of a logical
//! register lives in the physical register `b / bus_width` blocks above the
//! logical register's address.

use crate::{
    bitrange::{BitRange, MAX_BIT},
    context::BusWidth,
    errors::{ConfigError, Result},
};

/// Largest number of fields one descriptor may describe.
pub const MAX_REPEAT: u32 = 4096;

/// Repeat parameters of a field descriptor. `None` selects the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Repetition {
    /// Number of fields; `None` for a single field.
    pub repeat: Option<u32>,
    /// Fields per logical register; `None` to put all of them in one.
    pub field_repeat: Option<u32>,
    /// Bytes between logical registers; defaults to the block size.
    pub stride: Option<i64>,
    /// Bits between fields within a logical register; defaults to the
    /// field width.
    pub field_stride: Option<i64>,
}

/// The part of a field that lives in one physical register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Segment {
    /// Byte address of the physical register.
    pub address: u64,
    /// Low bit within the physical register.
    pub low: u32,
    /// High bit within the physical register.
    pub high: u32,
    /// Bit of the field value that lands on `low`.
    pub field_low: u32,
}

impl Segment {
    /// Number of field bits in this segment.
    pub fn width(&self) -> u32 {
        self.high - self.low + 1
    }
}

/// Placement of one field index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldPlacement {
    pub index: u32,
    /// Address of the logical register.
    pub address: u64,
    /// Low bit within the logical register, before spillover.
    pub low: u32,
    /// High bit within the logical register, before spillover.
    pub high: u32,
    /// Lowest address first. Concatenating the segments in order yields the
    /// field value, least-significant segment first.
    pub segments: Vec<Segment>,
}

impl FieldPlacement {
    /// Number of bits in the field.
    pub fn width(&self) -> u32 {
        self.high - self.low + 1
    }
}

/// Placement of every index of a field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldLayout {
    pub fields: Vec<FieldPlacement>,
}

impl FieldLayout {
    /// Number of field indices.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no field indices. [expand] never produces this.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Placement of field index `index`.
    pub fn get(&self, index: usize) -> Option<&FieldPlacement> {
        self.fields.get(index)
    }

    /// Placements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldPlacement> {
        self.fields.iter()
    }

    /// First pair of indices that share a bit of the same physical register.
    /// [expand] does not reject such layouts; whoever assembles the register
    /// file decides.
    pub fn find_overlap(&self) -> Option<(u32, u32)> {
        for (i, a) in self.fields.iter().enumerate() {
            for b in &self.fields[i + 1..] {
                let overlaps = a.segments.iter().any(|sa| {
                    b.segments.iter().any(|sb| {
                        sa.address == sb.address && sa.low <= sb.high && sb.low <= sa.high
                    })
                });
                if overlaps {
                    return Some((a.index, b.index));
                }
            }
        }
        None
    }
}

/// Expands `bitrange`, moved by `offset` bytes, into the placement of every
/// field index described by `repetition`.
pub fn expand(bitrange: &BitRange, offset: i64, repetition: &Repetition) -> Result<FieldLayout> {
    let repeat = repetition.repeat.unwrap_or(1);
    if repeat == 0 {
        return Err(ConfigError::bitrange_value("repeat must be at least 1"));
    }
    if repeat > MAX_REPEAT {
        return Err(ConfigError::bitrange_value(format!(
            "repeat {repeat} exceeds the maximum of {MAX_REPEAT}"
        )));
    }
    let field_repeat = repetition.field_repeat.unwrap_or(repeat);
    if field_repeat == 0 {
        return Err(ConfigError::bitrange_value("field-repeat must be at least 1"));
    }

    let block_bytes = bitrange.block_bytes();
    let stride = repetition
        .stride
        .map(i128::from)
        .unwrap_or_else(|| i128::from(block_bytes));
    let field_stride = repetition
        .field_stride
        .map(i128::from)
        .unwrap_or_else(|| i128::from(bitrange.width()));
    let base = i128::from(bitrange.address()) + i128::from(offset);

    let mut fields = Vec::with_capacity(repeat as usize);
    for index in 0..repeat {
        let register = i128::from(index / field_repeat);
        let lane = i128::from(index % field_repeat);

        let address = base + register * stride;
        let address = u64::try_from(address).map_err(|_| {
            ConfigError::bitrange_value(format!("address of index {index} is out of range"))
        })?;

        let low = i128::from(bitrange.low()) + lane * field_stride;
        let high = i128::from(bitrange.high()) + lane * field_stride;
        let (low, high) = match (u32::try_from(low), u32::try_from(high)) {
            (Ok(low), Ok(high)) if high <= MAX_BIT => (low, high),
            _ => {
                return Err(ConfigError::bitrange_value(format!(
                    "bit indices of index {index} are out of range"
                )));
            }
        };

        fields.push(FieldPlacement {
            index,
            address,
            low,
            high,
            segments: spill(bitrange.bus_width(), address, block_bytes, low, high)?,
        });
    }

    Ok(FieldLayout { fields })
}

/// Splits bits `high..low` of the logical register at `address` into
/// physical register segments, `block_bytes` apart. Fails when a segment
/// address does not fit in 64 bits.
pub fn spill(
    bus_width: BusWidth,
    address: u64,
    block_bytes: u64,
    low: u32,
    high: u32,
) -> Result<Vec<Segment>> {
    if low > high || high > MAX_BIT {
        return Err(ConfigError::bitrange_value(format!(
            "bits {high}..{low} are out of range"
        )));
    }
    let bits = bus_width.bits();
    let first = low / bits;
    let last = high / bits;

    let mut segments = Vec::with_capacity((last - first + 1) as usize);
    for register in first..=last {
        let address = u64::from(register)
            .checked_mul(block_bytes)
            .and_then(|step| address.checked_add(step))
            .ok_or_else(|| {
                ConfigError::bitrange_value(format!(
                    "address of segment {} is out of range",
                    register - first
                ))
            })?;
        let register_low = register * bits;
        let segment_low = low.max(register_low);
        let segment_high = high.min(register_low + (bits - 1));

        segments.push(Segment {
            address,
            low: segment_low - register_low,
            high: segment_high - register_low,
            field_low: segment_low - low,
        });
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn range32(spec: &str) -> BitRange {
        BitRange::parse(BusWidth::W32, spec).unwrap()
    }

    fn segment(address: u64, high: u32, low: u32, field_low: u32) -> Segment {
        Segment {
            address,
            low,
            high,
            field_low,
        }
    }

    #[test]
    fn test_single_register() {
        let layout = expand(&range32("0x10:7..0"), 0, &Repetition::default()).unwrap();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.fields[0].segments, vec![segment(0x10, 7, 0, 0)]);
    }

    #[test]
    fn test_offset_is_added() {
        let layout = expand(&range32("0x10:7..0"), 0x100, &Repetition::default()).unwrap();
        assert_eq!(layout.fields[0].address, 0x110);
        assert!(expand(&range32("0x10:7..0"), -0x11, &Repetition::default()).is_err());
    }

    #[test]
    fn test_spillover() {
        let layout = expand(&range32("8:47..8"), 0, &Repetition::default()).unwrap();
        let field = &layout.fields[0];
        assert_eq!(field.width(), 40);
        assert_eq!(
            field.segments,
            vec![segment(0x08, 31, 8, 0), segment(0x0C, 15, 0, 24)]
        );
        let total: u32 = field.segments.iter().map(Segment::width).sum();
        assert_eq!(total, 40);
    }

    #[test]
    fn test_spillover_with_large_block() {
        let layout = expand(&range32("8/3:47..8"), 0, &Repetition::default()).unwrap();
        assert_eq!(
            layout.fields[0].segments,
            vec![segment(0x08, 31, 8, 0), segment(0x10, 15, 0, 24)]
        );
    }

    #[test]
    fn test_array_with_field_repeat() {
        let repetition = Repetition {
            repeat: Some(7),
            field_repeat: Some(3),
            ..Default::default()
        };
        let layout = expand(&range32("0x20:7..0"), 0, &repetition).unwrap();
        let placed: Vec<(u64, u32, u32)> = layout
            .iter()
            .map(|f| {
                assert_eq!(f.segments.len(), 1);
                let s = f.segments[0];
                (s.address, s.high, s.low)
            })
            .collect();
        assert_eq!(
            placed,
            vec![
                (0x20, 7, 0),
                (0x20, 15, 8),
                (0x20, 23, 16),
                (0x24, 7, 0),
                (0x24, 15, 8),
                (0x24, 23, 16),
                (0x28, 7, 0),
            ]
        );
        assert_eq!(layout.find_overlap(), None);
    }

    #[test]
    fn test_array_in_one_logical_register() {
        let repetition = Repetition {
            repeat: Some(7),
            ..Default::default()
        };
        let layout = expand(&range32("0x20:7..0"), 0, &repetition).unwrap();
        assert_eq!(layout.fields[3].segments, vec![segment(0x20, 31, 24, 0)]);
        assert_eq!(layout.fields[4].segments, vec![segment(0x24, 7, 0, 0)]);
        assert_eq!(layout.fields[6].segments, vec![segment(0x24, 23, 16, 0)]);
        assert!(layout.iter().all(|f| f.address == 0x20));
    }

    #[test]
    fn test_lane_straddling_register_boundary() {
        let repetition = Repetition {
            repeat: Some(2),
            ..Default::default()
        };
        let layout = expand(&range32("0:19..0"), 0, &repetition).unwrap();
        assert_eq!(
            layout.fields[1].segments,
            vec![segment(0x0, 31, 20, 0), segment(0x4, 7, 0, 12)]
        );
    }

    #[test]
    fn test_explicit_strides() {
        let repetition = Repetition {
            repeat: Some(4),
            field_repeat: Some(2),
            stride: Some(-8),
            field_stride: Some(16),
        };
        let layout = expand(&range32("0x40:3..0"), 0, &repetition).unwrap();
        let placed: Vec<(u64, u32, u32)> = layout
            .iter()
            .map(|f| (f.address, f.high, f.low))
            .collect();
        assert_eq!(
            placed,
            vec![(0x40, 3, 0), (0x40, 19, 16), (0x38, 3, 0), (0x38, 19, 16)]
        );
    }

    #[test]
    fn test_negative_field_stride() {
        let repetition = Repetition {
            repeat: Some(3),
            field_stride: Some(-8),
            ..Default::default()
        };
        let layout = expand(&range32("0:23..16"), 0, &repetition).unwrap();
        assert_eq!(layout.fields[2].low, 0);
        assert_eq!(layout.fields[2].high, 7);

        let repetition = Repetition {
            repeat: Some(4),
            field_stride: Some(-8),
            ..Default::default()
        };
        let err = expand(&range32("0:23..16"), 0, &repetition).unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::errors::ErrorKind::InvalidBitRangeValue { .. }
        ));
    }

    #[test]
    fn test_negative_address_is_rejected() {
        let repetition = Repetition {
            repeat: Some(2),
            field_repeat: Some(1),
            stride: Some(-8),
            ..Default::default()
        };
        assert!(expand(&range32("4:7..0"), 0, &repetition).is_err());
    }

    #[test]
    fn test_zero_repeat_is_rejected() {
        let repetition = Repetition {
            repeat: Some(0),
            ..Default::default()
        };
        assert!(expand(&range32("0:7..0"), 0, &repetition).is_err());
        let repetition = Repetition {
            repeat: Some(2),
            field_repeat: Some(0),
            ..Default::default()
        };
        assert!(expand(&range32("0:7..0"), 0, &repetition).is_err());
    }

    #[test]
    fn test_repeat_is_bounded() {
        let repetition = Repetition {
            repeat: Some(MAX_REPEAT),
            field_repeat: Some(1),
            ..Default::default()
        };
        assert_eq!(expand(&range32("0:0"), 0, &repetition).unwrap().len(), 4096);

        let repetition = Repetition {
            repeat: Some(4_000_000_000),
            field_repeat: Some(1),
            ..Default::default()
        };
        let err = expand(&range32("0:0"), 0, &repetition).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBitRangeValue { .. }));
    }

    #[test]
    fn test_lane_bits_are_bounded() {
        let repetition = Repetition {
            repeat: Some(2),
            field_stride: Some(1 << 40),
            ..Default::default()
        };
        let err = expand(&range32("0:7..0"), 0, &repetition).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBitRangeValue { .. }));
    }

    #[test]
    fn test_segment_address_overflow() {
        let err = expand(&range32("/63:95..0"), 0, &Repetition::default()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBitRangeValue { .. }));

        assert!(spill(BusWidth::W32, u64::MAX - 3, 4, 0, 63).is_err());
        assert!(spill(BusWidth::W32, u64::MAX - 3, 4, 0, 31).is_ok());
        assert!(spill(BusWidth::W32, 0, 4, 8, 7).is_err());
    }

    #[test]
    fn test_overlap_is_reported_not_rejected() {
        let repetition = Repetition {
            repeat: Some(3),
            field_stride: Some(4),
            ..Default::default()
        };
        let layout = expand(&range32("0:7..0"), 0, &repetition).unwrap();
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.find_overlap(), Some((0, 1)));
    }

    #[test]
    fn test_stride_shorter_than_register_overlaps() {
        let repetition = Repetition {
            repeat: Some(2),
            field_repeat: Some(1),
            stride: Some(4),
            ..Default::default()
        };
        let layout = expand(&range32("0:47..0"), 0, &repetition).unwrap();
        assert_eq!(layout.find_overlap(), Some((0, 1)));
    }

    #[test]
    fn test_spill_64_bit() {
        let segments = spill(BusWidth::W64, 0x100, 8, 60, 70).unwrap();
        assert_eq!(
            segments,
            vec![segment(0x100, 63, 60, 0), segment(0x108, 6, 0, 4)]
        );
    }
}
