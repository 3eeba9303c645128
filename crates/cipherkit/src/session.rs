//! Streaming cipher sessions.
//!
//! A [`CipherSession`] owns one primitive context for its whole life. The
//! context is released exactly once: when `finalize` completes (successfully
//! or not), when an `update` or `absorb` fails, or when the session is
//! dropped. Terminal sessions reject every further operation.

use crate::config::SessionConfig;
use crate::descriptor::CipherDescriptor;
use crate::direction::Direction;
use crate::error::CipherError;
use crate::primitive::{Control, MAX_TAG_LEN, PrimitiveContext};
use zeroize::Zeroize;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Authenticated session that has not seen payload yet
    AcceptingAssociatedData,
    /// Payload is being processed
    Streaming,
    /// Finalize succeeded (terminal)
    Finalized,
    /// An operation failed fatally (terminal)
    Failed,
}

impl SessionState {
    /// Whether no further operation is accepted.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Finalized | SessionState::Failed)
    }
}

/// One encryption or decryption pass bound to a key and IV.
pub struct CipherSession<'d> {
    descriptor: &'d CipherDescriptor,
    direction: Direction,
    context: Option<PrimitiveContext>,
    state: SessionState,
    config: SessionConfig,
    payload_started: bool,
    tag_installed: bool,
    tag: Option<[u8; MAX_TAG_LEN]>,
}

impl<'d> CipherSession<'d> {
    /// Validate inputs and bring up the primitive context.
    ///
    /// Lengths and the direction flag are checked before the primitive is
    /// touched, in the order key, direction, configuration, IV.
    pub(crate) fn start(
        descriptor: &'d CipherDescriptor,
        key: &[u8],
        iv: &[u8],
        enc: i32,
        config: &SessionConfig,
    ) -> Result<Self, CipherError> {
        if key.len() != descriptor.key_len() {
            return Err(CipherError::InvalidKeyLength {
                expected: descriptor.key_len(),
                actual: key.len(),
            });
        }
        let direction = Direction::try_from(enc)?;
        config.validate()?;

        let handle = descriptor.handle();
        let mut context = PrimitiveContext::new();
        context.set_padding(config.padding);

        if descriptor.is_authenticated() {
            // The nonce length has to be announced before key and IV are bound.
            context.init(Some(handle), None, None, direction)?;
            context.ctrl(Control::SetIvLen(iv.len()))?;
            context.init(None, Some(key), Some(iv), direction)?;
        } else {
            if iv.len() != descriptor.iv_len() {
                return Err(CipherError::InvalidIvLength {
                    expected: descriptor.iv_len(),
                    actual: iv.len(),
                });
            }
            context.init(Some(handle), Some(key), Some(iv), direction)?;
        }

        let state = if descriptor.is_authenticated() {
            SessionState::AcceptingAssociatedData
        } else {
            SessionState::Streaming
        };
        tracing::trace!(
            cipher = descriptor.name(),
            ?direction,
            ?state,
            "cipher session started"
        );

        Ok(Self {
            descriptor,
            direction,
            context: Some(context),
            state,
            config: config.clone(),
            payload_started: false,
            tag_installed: false,
            tag: None,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Direction fixed at `begin`.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Descriptor this session was started from.
    #[must_use]
    pub fn descriptor(&self) -> &'d CipherDescriptor {
        self.descriptor
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Check if a state transition is valid
    #[must_use]
    pub fn can_transition(&self, to: SessionState) -> bool {
        match (self.state, to) {
            // Associated data may continue, or give way to anything else
            (SessionState::AcceptingAssociatedData, _) => true,

            // Payload never reopens associated data
            (
                SessionState::Streaming,
                SessionState::Streaming | SessionState::Finalized | SessionState::Failed,
            ) => true,

            // Terminal states stay put
            _ => false,
        }
    }

    /// Transition to a new state, releasing the context on terminal ones.
    fn transition_to(&mut self, new_state: SessionState) -> Result<(), CipherError> {
        if !self.can_transition(new_state) {
            return Err(CipherError::InvalidSessionState("invalid state transition"));
        }

        if self.state != new_state {
            tracing::debug!(
                "Cipher session state transition: {:?} -> {:?}",
                self.state,
                new_state
            );
        }
        self.state = new_state;

        if new_state.is_terminal() {
            self.context = None;
        }
        Ok(())
    }

    /// Move to `Failed` and hand back the error that caused it.
    fn fail(&mut self, err: CipherError) -> CipherError {
        if matches!(err, CipherError::TagMismatch) {
            tracing::warn!(cipher = self.descriptor.name(), "authentication tag mismatch");
        }
        // Only reachable from a non-terminal state, where Failed is always allowed.
        let _ = self.transition_to(SessionState::Failed);
        err
    }

    fn ensure_open(&self) -> Result<(), CipherError> {
        match self.state {
            SessionState::Finalized => Err(CipherError::InvalidSessionState("session already finalized")),
            SessionState::Failed => Err(CipherError::InvalidSessionState("session has failed")),
            _ => Ok(()),
        }
    }

    fn context_mut(&mut self) -> Result<&mut PrimitiveContext, CipherError> {
        self.context
            .as_mut()
            .ok_or(CipherError::InvalidSessionState("context already released"))
    }

    fn is_authenticated_encrypt(&self) -> bool {
        self.descriptor.is_authenticated() && self.direction == Direction::Encrypt
    }

    fn is_authenticated_decrypt(&self) -> bool {
        self.descriptor.is_authenticated() && self.direction == Direction::Decrypt
    }

    /// Enable or disable PKCS#7 padding (ECB/CBC only).
    ///
    /// Only allowed before the first [`update`](Self::update). Stream and
    /// authenticated modes accept the call and ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidSessionState`] once payload processing
    /// has started or the session is terminal.
    pub fn set_padding(&mut self, enabled: bool) -> Result<(), CipherError> {
        self.ensure_open()?;
        if self.payload_started {
            return Err(CipherError::InvalidSessionState(
                "padding must be set before the first update",
            ));
        }
        self.context_mut()?.set_padding(enabled);
        self.config.padding = enabled;
        Ok(())
    }

    /// Authenticate data without producing output.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidSessionState`] for non-authenticated
    /// ciphers, after payload processing has begun, or after finalize.
    /// A primitive failure is fatal and returned as
    /// [`CipherError::CipherOperationFailed`].
    pub fn absorb(&mut self, associated_data: &[u8]) -> Result<(), CipherError> {
        if !self.descriptor.is_authenticated() {
            return Err(CipherError::InvalidSessionState(
                "associated data requires an authenticated cipher",
            ));
        }
        self.ensure_open()?;
        if self.state != SessionState::AcceptingAssociatedData {
            return Err(CipherError::InvalidSessionState(
                "associated data must precede payload",
            ));
        }

        let result = self.context_mut()?.update(None, associated_data);
        match result {
            Ok(_) => self.transition_to(SessionState::AcceptingAssociatedData),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Process a chunk of payload.
    ///
    /// Returns the bytes produced by this call, which may be fewer than the
    /// input (block modes buffer partial blocks) or none at all. The first
    /// call on an authenticated session closes associated data, even when
    /// `input` is empty.
    ///
    /// When decrypting with an authenticated cipher, returned plaintext is
    /// provisional: it must not be used until [`finalize`](Self::finalize)
    /// has verified the tag.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidSessionState`] on a terminal session.
    /// A primitive failure is fatal.
    pub fn update(&mut self, input: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.ensure_open()?;
        self.transition_to(SessionState::Streaming)?;
        self.payload_started = true;

        let mut out = vec![0u8; input.len() + self.descriptor.block_size() - 1];
        let result = self.context_mut()?.update(Some(&mut out), input);
        match result {
            Ok(written) => {
                out.truncate(written);
                Ok(out)
            }
            Err(e) => {
                out.zeroize();
                Err(self.fail(e.into()))
            }
        }
    }

    /// Flush buffered data and close the session.
    ///
    /// Authenticated decryption verifies the tag installed with
    /// [`set_tag`](Self::set_tag); authenticated encryption makes the tag
    /// available through [`get_tag`](Self::get_tag). The session is terminal
    /// afterwards whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`CipherError::InvalidSessionState`] if the session is terminal, or
    ///   if it is an authenticated decrypt with no tag installed (the session
    ///   stays usable in that case)
    /// - [`CipherError::TagMismatch`] if verification fails
    /// - [`CipherError::CipherOperationFailed`] for padding or alignment errors
    pub fn finalize(&mut self) -> Result<Vec<u8>, CipherError> {
        self.ensure_open()?;
        if self.is_authenticated_decrypt() && !self.tag_installed {
            return Err(CipherError::InvalidSessionState(
                "expected tag must be set before finalize",
            ));
        }

        let mut out = vec![0u8; self.descriptor.block_size()];
        let authenticated_encrypt = self.is_authenticated_encrypt();
        let result = self.context_mut().and_then(|ctx| {
            let written = ctx.finalize(&mut out)?;
            if authenticated_encrypt {
                let mut tag = [0u8; MAX_TAG_LEN];
                ctx.ctrl(Control::GetTag(&mut tag))?;
                return Ok((written, Some(tag)));
            }
            Ok((written, None))
        });

        match result {
            Ok((written, tag)) => {
                self.tag = tag;
                self.transition_to(SessionState::Finalized)?;
                out.truncate(written);
                Ok(out)
            }
            Err(e) => {
                out.zeroize();
                Err(self.fail(e))
            }
        }
    }

    /// Leading `len` bytes of the authentication tag.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidSessionState`] unless this is an
    /// authenticated encrypt session that finalized successfully, and
    /// [`CipherError::InvalidTagLength`] if `len` is not in 1..=16.
    pub fn get_tag(&self, len: usize) -> Result<Vec<u8>, CipherError> {
        if !self.is_authenticated_encrypt() {
            return Err(CipherError::InvalidSessionState(
                "tags are produced by authenticated encryption only",
            ));
        }
        let tag = self
            .tag
            .as_ref()
            .filter(|_| self.state == SessionState::Finalized)
            .ok_or(CipherError::InvalidSessionState("tag available after finalize"))?;
        if len == 0 || len > MAX_TAG_LEN {
            return Err(CipherError::InvalidTagLength(len));
        }
        Ok(tag[..len].to_vec())
    }

    /// Tag truncated to the configured [`SessionConfig::tag_len`].
    ///
    /// # Errors
    ///
    /// Same as [`get_tag`](Self::get_tag).
    pub fn tag(&self) -> Result<Vec<u8>, CipherError> {
        self.get_tag(self.config.tag_len)
    }

    /// Install the expected tag for authenticated decryption.
    ///
    /// Tags shorter than 16 bytes are compared against the same-length prefix
    /// of the computed tag.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidSessionState`] unless this is an open
    /// authenticated decrypt session, and [`CipherError::InvalidTagLength`]
    /// (not fatal) for tags outside 1..=16 bytes.
    pub fn set_tag(&mut self, tag: &[u8]) -> Result<(), CipherError> {
        if !self.is_authenticated_decrypt() {
            return Err(CipherError::InvalidSessionState(
                "expected tag applies to authenticated decryption only",
            ));
        }
        self.ensure_open()?;
        if tag.is_empty() || tag.len() > MAX_TAG_LEN {
            return Err(CipherError::InvalidTagLength(tag.len()));
        }

        self.context_mut()?.ctrl(Control::SetTag(tag))?;
        self.tag_installed = true;
        Ok(())
    }
}

impl Drop for CipherSession<'_> {
    fn drop(&mut self) {
        if let Some(tag) = self.tag.as_mut() {
            tag.zeroize();
        }
    }
}

impl std::fmt::Debug for CipherSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherSession")
            .field("cipher", &self.descriptor.name())
            .field("direction", &self.direction)
            .field("state", &self.state)
            .field("context", &self.context.as_ref().map(|_| "<active>"))
            .finish_non_exhaustive()
    }
}
