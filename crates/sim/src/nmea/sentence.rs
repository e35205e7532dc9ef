use std::fmt::{Display, Write};

use super::checksum;

/// Accumulates comma-separated fields and appends the checksum on `finish`.
#[derive(Debug, Clone)]
pub struct SentenceBuilder {
    buf: String,
}

impl SentenceBuilder {
    /// `$` sentence, e.g. `SentenceBuilder::parametric("GPRMC")`.
    pub fn parametric(address: &str) -> Self {
        Self::with_delimiter('$', address)
    }

    /// `!` sentence carrying an encapsulated payload (AIS).
    pub fn encapsulated(address: &str) -> Self {
        Self::with_delimiter('!', address)
    }

    fn with_delimiter(delimiter: char, address: &str) -> Self {
        let mut buf = String::with_capacity(82);
        buf.push(delimiter);
        buf.push_str(address);
        Self { buf }
    }

    pub fn field(mut self, value: impl Display) -> Self {
        self.buf.push(',');
        // Writing into a String cannot fail.
        let _ = write!(self.buf, "{}", value);
        self
    }

    pub fn fixed(self, value: f64, decimals: usize) -> Self {
        self.field(format_args!("{:.*}", decimals, value))
    }

    /// Direction in degrees with one decimal, always within `0.0..=359.9`.
    pub fn angle(self, degrees: f64) -> Self {
        // abs() clears the negative zero rem_euclid keeps.
        let tenths = (degrees * 10.0).round().rem_euclid(3600.0).abs();
        self.fixed(tenths / 10.0, 1)
    }

    pub fn empty(mut self) -> Self {
        self.buf.push(',');
        self
    }

    pub fn finish(self) -> String {
        let checksum = checksum::compute(&self.buf[1..]);
        format!("{}*{:02X}", self.buf, checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_heading_sentence() {
        let sentence = SentenceBuilder::parametric("IIHDT")
            .fixed(45.0, 1)
            .field('T')
            .finish();
        assert_eq!(sentence, "$IIHDT,45.0,T*13");
    }

    #[test]
    fn empty_fields_keep_their_commas() {
        let sentence = SentenceBuilder::parametric("GPXXX")
            .field(1)
            .empty()
            .empty()
            .finish();
        assert!(sentence.starts_with("$GPXXX,1,,*"));
        assert!(checksum::verify(&sentence));
    }

    #[test]
    fn angles_that_round_up_to_a_full_turn_wrap_to_zero() {
        let sentence = SentenceBuilder::parametric("IIHDT")
            .angle(359.96)
            .angle(-0.01)
            .angle(720.04)
            .angle(12.34)
            .finish();
        assert!(sentence.starts_with("$IIHDT,0.0,0.0,0.0,12.3*"), "{}", sentence);
    }
}
