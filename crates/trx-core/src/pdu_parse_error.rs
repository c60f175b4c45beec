use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduParseErr {
    BufferEnded { field: Option<&'static str> },
    InvalidValue { field: &'static str, value: i64 },
    InconsistentLength { expected: usize, found: usize },
    Inconsistency { field: &'static str, reason: &'static str },
    UnsupportedVersion { version: u8 },
    TrailingBytes { count: usize },
}

impl fmt::Display for PduParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PduParseErr::BufferEnded { field: Some(field) } => write!(f, "buffer ended while reading {}", field),
            PduParseErr::BufferEnded { field: None } => write!(f, "buffer ended"),
            PduParseErr::InvalidValue { field, value } => write!(f, "{} {} is out of range", field, value),
            PduParseErr::InconsistentLength { expected, found } => {
                write!(f, "inconsistent length: expected {}, found {}", expected, found)
            }
            PduParseErr::Inconsistency { field, reason } => write!(f, "{}: {}", field, reason),
            PduParseErr::UnsupportedVersion { version } => write!(f, "unknown TRXD header version {}", version),
            PduParseErr::TrailingBytes { count } => write!(f, "{} unhandled trailing octets", count),
        }
    }
}

impl std::error::Error for PduParseErr {}

/// Checks whether a value lies within an inclusive range. If not, returns PduParseErr::InvalidValue
#[macro_export]
macro_rules! expect_range {
    ($value:ident, $min:expr, $max:expr) => {
        $crate::expect_range!(@inner $value, $min, $max, stringify!($value))
    };
    ($value:expr, $min:expr, $max:expr, $field:expr) => {
        $crate::expect_range!(@inner $value, $min, $max, $field)
    };

    (@inner $value:expr, $min:expr, $max:expr, $field:expr) => {{
        let val = $value;
        if val >= $min && val <= $max {
            Ok(())
        } else {
            Err($crate::PduParseErr::InvalidValue {
                field: $field,
                value: val as i64,
            })
        }
    }};
}
