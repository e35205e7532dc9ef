/// XOR of every byte in `body`.
pub fn compute(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Checks a full sentence (`$...*hh` or `!...*hh`, trailing CR/LF allowed).
pub fn verify(sentence: &str) -> bool {
    let sentence = sentence.trim_end_matches(['\r', '\n']);

    let Some(body) = sentence
        .strip_prefix('$')
        .or_else(|| sentence.strip_prefix('!'))
    else {
        return false;
    };

    let Some((body, hex)) = body.rsplit_once('*') else {
        return false;
    };

    if hex.len() != 2 || hex.bytes().any(|b| b.is_ascii_lowercase()) {
        return false;
    }

    u8::from_str_radix(hex, 16).is_ok_and(|expected| expected == compute(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sentences() {
        assert!(verify(
            "$GPGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*76"
        ));
        assert!(verify("!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5C"));
        assert!(verify("$IIHDT,45.0,T*13\r\n"));
    }

    #[test]
    fn rejects_tampering() {
        assert!(!verify("$IIHDT,46.0,T*13"));
        assert!(!verify("IIHDT,45.0,T*13"));
        assert!(!verify("$IIHDT,45.0,T"));
        assert!(!verify("!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5c"));
        assert!(!verify("$IIHDT,45.0,T*1"));
    }
}
