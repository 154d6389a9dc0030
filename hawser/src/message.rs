//! Multipart messages.
//!
//! A message owns an ordered sequence of frames; wire order is sequence
//! order. Messages are confined to their creating thread unless promoted,
//! like sockets. Copying a message duplicates every frame transitively.
//!
//! `append_frames` converts a structured sequence of host values into
//! frames, one per element, in order. On the first unconvertible element it
//! fails naming that element's position; frames already appended for
//! earlier elements stay attached. That partial-append outcome is
//! intentional, long-standing behavior; callers that need all-or-nothing
//! append build the message separately and push it whole.

use bytes::Bytes;
use smallvec::SmallVec;

use crate::affinity::ThreadAffinity;
use crate::error::{HawserError, Result};
use crate::frame::Frame;

const RESOURCE: &str = "Message";

/// A structured input value destined for one frame.
///
/// This is the boundary where host-language sequences enter the binding:
/// binary data and text become single frames verbatim; nesting a sequence
/// inside a sequence is rejected.
#[derive(Debug, Clone)]
pub enum FrameValue {
    Data(Bytes),
    Text(String),
    Sequence(Vec<FrameValue>),
}

impl From<Bytes> for FrameValue {
    fn from(data: Bytes) -> Self {
        Self::Data(data)
    }
}

impl From<Vec<u8>> for FrameValue {
    fn from(data: Vec<u8>) -> Self {
        Self::Data(Bytes::from(data))
    }
}

impl From<&[u8]> for FrameValue {
    fn from(data: &[u8]) -> Self {
        Self::Data(Bytes::copy_from_slice(data))
    }
}

impl From<&str> for FrameValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<FrameValue>> for FrameValue {
    fn from(values: Vec<FrameValue>) -> Self {
        Self::Sequence(values)
    }
}

/// An ordered sequence of frames, sent and received atomically.
#[derive(Debug)]
pub struct Message {
    frames: SmallVec<[Frame; 4]>,
    affinity: ThreadAffinity,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// An empty message owned by the calling thread.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: SmallVec::new(),
            affinity: ThreadAffinity::new(),
        }
    }

    /// Build a message from existing frames.
    #[must_use]
    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            affinity: ThreadAffinity::new(),
        }
    }

    /// Deep-copy `self`, duplicating every frame. The copy belongs to the
    /// calling thread.
    #[must_use]
    pub fn copy_of(&self) -> Self {
        Self {
            frames: self.frames.iter().map(Frame::copy_of).collect(),
            affinity: ThreadAffinity::new(),
        }
    }

    /// Append one frame.
    pub fn push(&mut self, frame: Frame) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.frames.push(frame);
        Ok(())
    }

    /// Convert `values` to frames in order and append them.
    ///
    /// Fails on the first element that is not binary data or text, naming
    /// its 0-based position and the total element count. Frames appended
    /// for earlier elements remain part of the message.
    pub fn append_frames(&mut self, values: &[FrameValue]) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        let len = values.len();
        for (index, value) in values.iter().enumerate() {
            match value {
                FrameValue::Data(data) => self.frames.push(Frame::from(data.clone())),
                FrameValue::Text(text) => self.frames.push(Frame::from(text.as_str())),
                FrameValue::Sequence(_) => {
                    return Err(HawserError::UnsupportedFrameValue { index, len });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frames in wire order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Promote for deliberate cross-thread sharing. One-way; panics if
    /// called twice.
    pub fn mark_thread_safe(&mut self) {
        self.affinity.mark_thread_safe();
    }

    pub(crate) fn into_wire_frames(self) -> Vec<Bytes> {
        self.frames.into_iter().map(Frame::into_bytes).collect()
    }

    pub(crate) fn from_wire_frames(frames: Vec<Bytes>) -> Self {
        Self {
            frames: frames.into_iter().map(Frame::from).collect(),
            affinity: ThreadAffinity::new(),
        }
    }
}
