use core::fmt;

/// Number of TDMA frames in a superframe (26 x 51 multiframes)
pub const GSM_SUPERFRAME: u32 = 26 * 51;
/// Number of TDMA frames in a hyperframe, the frame number wraps here
pub const GSM_HYPERFRAME: u32 = 2048 * GSM_SUPERFRAME;
/// Nominal duration of a single TDMA frame, in microseconds
pub const GSM_FRAME_US: u64 = 4615;

/// GSM time as broadcast on SCH, derived from a TDMA frame number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GsmTime {
    /// Superframe count, 0..2047
    pub t1: u32,
    /// Position in the 26-multiframe, 0..25
    pub t2: u32,
    /// Position in the 51-multiframe, 0..50
    pub t3: u32,
    /// Block counter, 0..7
    pub tc: u32,
}

impl GsmTime {
    pub fn from_fn(fn_num: u32) -> GsmTime {
        GsmTime {
            t1: fn_num / GSM_SUPERFRAME,
            t2: fn_num % 26,
            t3: fn_num % 51,
            tc: (fn_num / 51) % 8,
        }
    }
}

impl fmt::Display for GsmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.t1, self.t2, self.t3, self.tc)
    }
}

/// Add a (possibly negative) number of frames, wrapping at the hyperframe boundary
pub fn fn_add(fn_num: u32, frames: i64) -> u32 {
    (fn_num as i64 + frames).rem_euclid(GSM_HYPERFRAME as i64) as u32
}

/// Difference `a - b` between two frame numbers, handling wrap-around of the hyperframe.
/// Result is in the range [-GSM_HYPERFRAME/2, GSM_HYPERFRAME/2).
pub fn fn_diff(a: u32, b: u32) -> i32 {
    let wrap = GSM_HYPERFRAME as i64;
    let mut diff = a as i64 - b as i64;
    while diff < -wrap / 2 { diff += wrap; }
    while diff >= wrap / 2 { diff -= wrap; }
    diff as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gsm_time_from_fn() {
        assert_eq!(GsmTime::from_fn(0), GsmTime { t1: 0, t2: 0, t3: 0, tc: 0 });
        assert_eq!(GsmTime::from_fn(1326), GsmTime { t1: 1, t2: 0, t3: 0, tc: 2 });
        let t = GsmTime::from_fn(GSM_HYPERFRAME - 1);
        assert_eq!(t, GsmTime { t1: 2047, t2: 25, t3: 50, tc: 7 });
        assert_eq!(format!("{}", t), "2047/25/50/7");
    }

    #[test]
    fn test_fn_add_and_diff() {
        assert_eq!(fn_add(GSM_HYPERFRAME - 1, 1), 0);
        assert_eq!(fn_add(0, -1), GSM_HYPERFRAME - 1);

        // Walk around the hyperframe a few times
        let mut fn_num = 0;
        for _ in 0..5000 {
            let next = fn_add(fn_num, 4321);
            assert_eq!(fn_diff(next, fn_num), 4321);
            assert_eq!(fn_diff(fn_num, next), -4321);
            fn_num = next;
        }
        assert!(fn_num < GSM_HYPERFRAME);
    }
}
