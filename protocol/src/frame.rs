//! Generic incremental record reassembler.
//!
//! A record is a fixed-size prefix followed by a remainder whose size the
//! prefix determines. The reader accepts chunks of any length and emits each
//! record the moment its last byte arrives, carrying surplus bytes over to
//! the next record. One chunk may complete many records, none, or only part
//! of one.

use crate::error::ProtocolError;

/// Framing rule for one record kind.
pub trait Framing {
    type Output;

    /// Bytes needed before the total record length is known.
    fn prefix_len(&self) -> usize;

    /// Total record length (prefix included), from the prefix bytes.
    /// An error here means the stream cannot be resynchronised.
    fn record_len(&mut self, prefix: &[u8]) -> Result<usize, ProtocolError>;

    /// Turn a complete record into output.
    fn complete(&mut self, record: &[u8]) -> Result<Self::Output, ProtocolError>;
}

pub struct FrameReader<F: Framing> {
    framing: F,
    buf: Vec<u8>,
    expected: Option<usize>,
    failed: bool,
}

impl<F: Framing> FrameReader<F> {
    pub fn new(framing: F) -> Self {
        let capacity = framing.prefix_len();
        Self {
            framing,
            buf: Vec::with_capacity(capacity),
            expected: None,
            failed: false,
        }
    }

    pub fn framing(&self) -> &F {
        &self.framing
    }

    /// Bytes held for the record in progress.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Whether the reader sits exactly between records.
    pub fn is_idle(&self) -> bool {
        self.buf.is_empty() && !self.failed
    }

    /// Feed one chunk, invoking `on_record` for each completed record in order.
    ///
    /// Records completed before an error in the same chunk are still delivered.
    /// After an error every further call returns [`ProtocolError::Closed`].
    pub fn feed_with(
        &mut self,
        chunk: &[u8],
        mut on_record: impl FnMut(F::Output),
    ) -> Result<(), ProtocolError> {
        if self.failed {
            return Err(ProtocolError::Closed);
        }
        let result = self.drive(chunk, &mut on_record);
        if result.is_err() {
            self.failed = true;
            self.buf.clear();
            self.expected = None;
        }
        result
    }

    /// Feed one chunk and collect the completed records.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<F::Output>, ProtocolError> {
        let mut out = Vec::new();
        self.feed_with(chunk, |record| out.push(record))?;
        Ok(out)
    }

    fn drive(
        &mut self,
        chunk: &[u8],
        on_record: &mut impl FnMut(F::Output),
    ) -> Result<(), ProtocolError> {
        let mut rest = chunk;
        loop {
            let target = match self.expected {
                Some(total) => total,
                None => self.framing.prefix_len(),
            };
            let want = target - self.buf.len();
            let take = want.min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.buf.len() < target {
                return Ok(());
            }

            if self.expected.is_none() {
                let total = self.framing.record_len(&self.buf)?;
                self.expected = Some(total.max(self.buf.len()));
                continue;
            }

            let record = self.framing.complete(&self.buf)?;
            self.buf.clear();
            self.expected = None;
            on_record(record);

            if rest.is_empty() {
                return Ok(());
            }
        }
    }
}
