//! Input buffer
//!
//! Holds at most one pending "start action" request per handle-weapon module.
//! A request made while the weapon is busy waits for Idle until its expiry.

/// One pending start request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferedRequest {
    pub requested_at: f32,
    pub expires_at: f32,
}

/// What `poll` decided this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPoll {
    Empty,
    Waiting,
    /// The request should fire now; the buffer has been cleared
    Fire,
    /// The request outlived its window and was dropped
    Expired,
}

#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    pending: Option<BufferedRequest>,
}

impl InputBuffer {
    /// Store a request. An existing request keeps its expiry unless
    /// `extend_on_new_input` is set.
    pub fn request(&mut self, now: f32, max_duration: f32, extend_on_new_input: bool) {
        match self.pending.as_mut() {
            None => {
                self.pending = Some(BufferedRequest {
                    requested_at: now,
                    expires_at: now + max_duration,
                });
            }
            Some(pending) if extend_on_new_input => {
                pending.requested_at = now;
                pending.expires_at = now + max_duration;
            }
            Some(_) => {}
        }
    }

    /// Check the pending request against the clock and the weapon's idleness.
    pub fn poll(&mut self, now: f32, weapon_idle: bool) -> BufferPoll {
        let Some(pending) = self.pending else {
            return BufferPoll::Empty;
        };
        if now > pending.expires_at {
            self.pending = None;
            BufferPoll::Expired
        } else if weapon_idle {
            self.pending = None;
            BufferPoll::Fire
        } else {
            BufferPoll::Waiting
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<BufferedRequest> {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}
