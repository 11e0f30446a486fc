//! Best-effort `signatureCipher` handling.
//!
//! The real transform lives in a player script we never download. What is
//! applied here is a fixed list of operations taken from configuration, so a
//! URL produced by [`SignatureDecoder`] may or may not be accepted upstream.

use std::{fmt, str::FromStr};

use reqwest::Url;

/// Ordered key/value pairs from a query-string shaped cipher blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherParameters {
    pairs: Vec<(String, String)>,
}

impl CipherParameters {
    /// Splits on `&`, then on the first `=`. Values are percent-decoded; `+`
    /// is left alone. Pairs without `=` keep an empty value.
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                let value = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                (key.to_string(), value)
            })
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigOp {
    Reverse,
    /// Drop the first `n` characters.
    Splice(usize),
    /// Swap position 0 with position `n % len`.
    Swap(usize),
}

impl SigOp {
    pub fn apply(&self, sig: &mut Vec<char>) {
        match *self {
            SigOp::Reverse => sig.reverse(),
            SigOp::Splice(n) => {
                sig.drain(..n.min(sig.len()));
            }
            SigOp::Swap(n) => {
                if !sig.is_empty() {
                    let idx = n % sig.len();
                    sig.swap(0, idx);
                }
            }
        }
    }
}

impl FromStr for SigOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s, None),
        };
        let number = |arg: Option<&str>| -> Result<usize, String> {
            arg.ok_or_else(|| format!("'{}' needs a numeric argument", s))?
                .parse::<usize>()
                .map_err(|e| format!("'{}': {}", s, e))
        };

        match name.to_ascii_lowercase().as_str() {
            "reverse" if arg.is_none() => Ok(SigOp::Reverse),
            "splice" | "slice" => number(arg).map(SigOp::Splice),
            "swap" => number(arg).map(SigOp::Swap),
            _ => Err(format!("unknown signature op '{}'", s)),
        }
    }
}

impl fmt::Display for SigOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigOp::Reverse => f.write_str("reverse"),
            SigOp::Splice(n) => write!(f, "splice:{}", n),
            SigOp::Swap(n) => write!(f, "swap:{}", n),
        }
    }
}

pub const DEFAULT_OPS: &[SigOp] = &[SigOp::Reverse, SigOp::Splice(2), SigOp::Swap(17)];

#[derive(Debug, Clone)]
pub struct SignatureDecoder {
    ops: Vec<SigOp>,
}

impl Default for SignatureDecoder {
    fn default() -> Self {
        Self {
            ops: DEFAULT_OPS.to_vec(),
        }
    }
}

impl SignatureDecoder {
    /// Parses the configured op list. Any invalid entry discards the whole
    /// list in favour of the defaults.
    pub fn from_config(ops: &[String]) -> Self {
        let parsed: Result<Vec<SigOp>, String> = ops.iter().map(|op| op.parse()).collect();
        match parsed {
            Ok(ops) if !ops.is_empty() => Self { ops },
            Ok(_) => Self::default(),
            Err(e) => {
                tracing::warn!("invalid signature_ops ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn ops(&self) -> &[SigOp] {
        &self.ops
    }

    pub fn transform(&self, sig: &str) -> String {
        let mut chars: Vec<char> = sig.chars().collect();
        for op in &self.ops {
            op.apply(&mut chars);
        }
        chars.into_iter().collect()
    }

    /// Builds a playable-looking URL from a cipher blob. `None` only when the
    /// blob lacks `url` or `s`; the result is never verified.
    pub fn decode_url(&self, cipher: &str) -> Option<String> {
        let params = CipherParameters::parse(cipher);
        let base = params.get("url").filter(|u| !u.is_empty())?;
        let sig = params.get("s").filter(|s| !s.is_empty())?;
        let sp = params
            .get("sp")
            .filter(|sp| !sp.is_empty())
            .unwrap_or("signature");
        let decoded = self.transform(sig);

        let extras: Vec<(&str, &str)> = params
            .iter()
            .filter(|(k, _)| !matches!(*k, "url" | "s" | "sp"))
            .collect();

        match Url::parse(base) {
            Ok(mut url) => {
                let existing: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
                {
                    let mut query = url.query_pairs_mut();
                    query.append_pair(sp, &decoded);
                    for (k, v) in &extras {
                        if !existing.iter().any(|e| e.as_str() == *k) {
                            query.append_pair(k, v);
                        }
                    }
                }
                Some(url.into())
            }
            Err(e) => {
                tracing::debug!("cipher url did not parse ({}), appending by hand", e);
                let mut out = base.to_string();
                let mut push = |k: &str, v: &str| {
                    out.push(if out.contains('?') { '&' } else { '?' });
                    out.push_str(k);
                    out.push('=');
                    out.push_str(&urlencoding::encode(v));
                };
                push(sp, &decoded);
                for (k, v) in extras {
                    push(k, v);
                }
                Some(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        let params = CipherParameters::parse("s=XYZ&url=http%3A%2F%2Fexample.com%2Fv&sp=sig");
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("s"), Some("XYZ"));
        assert_eq!(params.get("url"), Some("http://example.com/v"));
        assert_eq!(params.get("sp"), Some("sig"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_parse_keeps_order_and_plus() {
        let params = CipherParameters::parse("b=2&a=1+1&flag");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1+1"), ("flag", "")]);
    }

    #[test]
    fn test_op_parsing() {
        assert_eq!("reverse".parse::<SigOp>().unwrap(), SigOp::Reverse);
        assert_eq!("splice:2".parse::<SigOp>().unwrap(), SigOp::Splice(2));
        assert_eq!(" SWAP: 17 ".parse::<SigOp>().unwrap(), SigOp::Swap(17));
        assert!("swap".parse::<SigOp>().is_err());
        assert!("reverse:1".parse::<SigOp>().is_err());
        assert!("rotate:3".parse::<SigOp>().is_err());
        assert_eq!(SigOp::Splice(3).to_string(), "splice:3");
    }

    #[test]
    fn test_ops_apply() {
        let mut sig: Vec<char> = "abcdef".chars().collect();
        SigOp::Reverse.apply(&mut sig);
        assert_eq!(sig.iter().collect::<String>(), "fedcba");
        SigOp::Splice(2).apply(&mut sig);
        assert_eq!(sig.iter().collect::<String>(), "dcba");
        SigOp::Swap(5).apply(&mut sig);
        assert_eq!(sig.iter().collect::<String>(), "cdba");
        SigOp::Splice(10).apply(&mut sig);
        assert!(sig.is_empty());
        SigOp::Swap(3).apply(&mut sig);
    }

    #[test]
    fn test_default_transform() {
        let decoder = SignatureDecoder::default();
        // reverse -> "tsrqponmlkjihgfedcba", splice:2 -> "rqponmlkjihgfedcba",
        // swap:17 swaps 'r' with 'a'
        assert_eq!(decoder.transform("abcdefghijklmnopqrst"), "aqponmlkjihgfedcbr");
    }

    #[test]
    fn test_from_config_falls_back() {
        let ops = vec!["reverse".to_string(), "bogus".to_string()];
        assert_eq!(SignatureDecoder::from_config(&ops).ops(), DEFAULT_OPS);
        assert_eq!(SignatureDecoder::from_config(&[]).ops(), DEFAULT_OPS);

        let ops = vec!["splice:1".to_string()];
        assert_eq!(SignatureDecoder::from_config(&ops).ops(), &[SigOp::Splice(1)]);
    }

    #[test]
    fn test_decode_url() {
        let decoder = SignatureDecoder::from_config(&["reverse".to_string()]);
        let url = decoder
            .decode_url("s=XYZ&url=http%3A%2F%2Fexample.com%2Fv%3Fitag%3D18&sp=sig&lsig=abc&itag=18")
            .unwrap();
        assert_eq!(url, "http://example.com/v?itag=18&sig=ZYX&lsig=abc");
    }

    #[test]
    fn test_decode_url_default_sp() {
        let decoder = SignatureDecoder::from_config(&["reverse".to_string()]);
        let url = decoder.decode_url("url=https%3A%2F%2Fv.example%2Fplay&s=ab").unwrap();
        assert_eq!(url, "https://v.example/play?signature=ba");
    }

    #[test]
    fn test_decode_url_requires_url_and_s() {
        let decoder = SignatureDecoder::default();
        assert!(decoder.decode_url("s=XYZ&sp=sig").is_none());
        assert!(decoder.decode_url("url=https%3A%2F%2Fv.example%2Fplay").is_none());
        assert!(decoder.decode_url("").is_none());
    }

    #[test]
    fn test_decode_url_unparseable_base() {
        let decoder = SignatureDecoder::from_config(&["reverse".to_string()]);
        let url = decoder.decode_url("url=%2Frelative%2Fpath&s=ab").unwrap();
        assert_eq!(url, "/relative/path?signature=ba");
    }
}
