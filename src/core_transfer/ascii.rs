const CR: u8 = b'\r';
const LF: u8 = b'\n';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Every LF becomes CRLF.
    Expand,
    /// CRLF becomes LF.
    Collapse,
}

/// Stateful ASCII-mode line-ending converter.
///
/// Collapsing carries one byte of state between buffers, so a CRLF pair split
/// across two reads is handled the same as an unsplit one. Expanding needs
/// no state.
#[derive(Debug, Clone)]
pub struct AsciiTranscoder {
    ending: LineEnding,
    /// A CR is held back while collapsing.
    carry_cr: bool,
}

impl AsciiTranscoder {
    pub fn new(ending: LineEnding) -> Self {
        Self {
            ending,
            carry_cr: false,
        }
    }

    /// Server-to-client conversion.
    pub fn for_download() -> Self {
        Self::new(LineEnding::Expand)
    }

    /// Client-to-server conversion. Windows stores CRLF, so uploads expand
    /// there as well.
    pub fn for_upload() -> Self {
        if cfg!(windows) {
            Self::new(LineEnding::Expand)
        } else {
            Self::new(LineEnding::Collapse)
        }
    }

    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Converts `source` into `dest`, replacing its previous contents.
    pub fn transcode(&mut self, source: &[u8], dest: &mut Vec<u8>) {
        dest.clear();
        match self.ending {
            LineEnding::Expand => self.expand(source, dest),
            LineEnding::Collapse => self.collapse(source, dest),
        }
    }

    /// Emits anything still held back once the source is exhausted.
    pub fn finish(&mut self, dest: &mut Vec<u8>) {
        dest.clear();
        if self.ending == LineEnding::Collapse && self.carry_cr {
            dest.push(CR);
        }
        self.carry_cr = false;
    }

    fn expand(&self, source: &[u8], dest: &mut Vec<u8>) {
        dest.reserve(source.len() + source.len() / 8);
        for &byte in source {
            if byte == LF {
                dest.push(CR);
            }
            dest.push(byte);
        }
    }

    fn collapse(&mut self, source: &[u8], dest: &mut Vec<u8>) {
        dest.reserve(source.len());
        for &byte in source {
            if self.carry_cr {
                self.carry_cr = false;
                if byte == LF {
                    dest.push(LF);
                    continue;
                }
                dest.push(CR);
            }
            if byte == CR {
                self.carry_cr = true;
            } else {
                dest.push(byte);
            }
        }
    }
}

/// One-shot conversion of a whole buffer.
pub fn transcode_all(ending: LineEnding, source: &[u8]) -> Vec<u8> {
    let mut transcoder = AsciiTranscoder::new(ending);
    let mut out = Vec::new();
    let mut tail = Vec::new();
    transcoder.transcode(source, &mut out);
    transcoder.finish(&mut tail);
    out.extend_from_slice(&tail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_chunks(mut transcoder: AsciiTranscoder, chunks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = Vec::new();
        for chunk in chunks {
            transcoder.transcode(chunk, &mut buf);
            out.extend_from_slice(&buf);
        }
        transcoder.finish(&mut buf);
        out.extend_from_slice(&buf);
        out
    }

    #[test]
    fn test_collapse_crlf() {
        assert_eq!(
            transcode_all(LineEnding::Collapse, b"line1\r\nline2\r\n"),
            b"line1\nline2\n"
        );
    }

    #[test]
    fn test_expand_lf() {
        assert_eq!(
            transcode_all(LineEnding::Expand, b"line1\nline2\n"),
            b"line1\r\nline2\r\n"
        );
    }

    #[test]
    fn test_round_trip_restores_crlf() {
        let original = b"line1\r\nline2\r\n";
        let stored = transcode_all(LineEnding::Collapse, original);
        let sent = transcode_all(LineEnding::Expand, &stored);
        assert_eq!(sent, original);
    }

    #[test]
    fn test_crlf_split_across_buffers() {
        let out = run_chunks(
            AsciiTranscoder::new(LineEnding::Collapse),
            &[b"line1\r", b"\nline2\r", b"\n"],
        );
        assert_eq!(out, b"line1\nline2\n");

        let out = run_chunks(
            AsciiTranscoder::new(LineEnding::Expand),
            &[b"line1", b"\nline2", b"\n"],
        );
        assert_eq!(out, b"line1\r\nline2\r\n");
    }

    #[test]
    fn test_lone_cr_is_preserved() {
        assert_eq!(transcode_all(LineEnding::Collapse, b"a\rb"), b"a\rb");
        assert_eq!(transcode_all(LineEnding::Collapse, b"a\r\r\nb"), b"a\r\nb");
        // A CR held at the very end is released by finish().
        assert_eq!(transcode_all(LineEnding::Collapse, b"end\r"), b"end\r");
    }

    #[test]
    fn test_expand_converts_every_lf() {
        assert_eq!(transcode_all(LineEnding::Expand, b"a\r\nb"), b"a\r\r\nb");
        assert_eq!(
            run_chunks(AsciiTranscoder::new(LineEnding::Expand), &[b"a\r", b"\nb\n"]),
            b"a\r\r\nb\r\n"
        );
    }

    #[test]
    fn test_platform_upload_direction() {
        let expected = if cfg!(windows) {
            LineEnding::Expand
        } else {
            LineEnding::Collapse
        };
        assert_eq!(AsciiTranscoder::for_upload().ending(), expected);
        assert_eq!(AsciiTranscoder::for_download().ending(), LineEnding::Expand);
    }
}
