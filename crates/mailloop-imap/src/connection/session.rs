//! IMAP retrieval session.

use std::fmt;

use mailloop_mime::FetchedMessage;
use mailloop_wire::{Credentials, FramedStream, FramerConfig, Stage};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use super::SessionState;
use crate::command::{Command, FetchItems, StoreAction, TagGenerator};
use crate::error::{Error, Result};
use crate::fetch::MessageData;
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{
    Capability, Flag, Flags, MailboxStatus, ResponseCode, SeqNum, SequenceSet, Status, Tag,
};

/// Tagged completion of one command, with the untagged data it claimed.
#[derive(Debug)]
struct Completion {
    code: Option<ResponseCode>,
    untagged: Vec<UntaggedResponse>,
}

/// A step while reading towards a tagged completion.
enum Step {
    Routed,
    Continuation,
    Done(Status, Option<ResponseCode>, String),
}

/// An IMAP session over any byte stream.
///
/// One command is outstanding at a time. Untagged data that does not
/// belong to the running command is kept in an unsolicited buffer, see
/// [`Self::unsolicited`]; EXISTS and EXPUNGE among it keep the selected
/// mailbox's message count current.
pub struct ImapSession<S> {
    framed: FramedStream<S>,
    tags: TagGenerator,
    state: SessionState,
    greeting: String,
    capabilities: Vec<Capability>,
    mailbox: Option<MailboxStatus>,
    unsolicited: Vec<UntaggedResponse>,
}

impl<S> fmt::Debug for ImapSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapSession")
            .field("state", &self.state)
            .field("mailbox", &self.mailbox.as_ref().map(|m| &m.name))
            .finish_non_exhaustive()
    }
}

impl<S> ImapSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting with default framing limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] if the server refuses the connection, or a
    /// protocol error for anything but `* OK` or `* PREAUTH`.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::from_stream_with_config(stream, FramerConfig::default()).await
    }

    /// Reads the server greeting using the given framing limits.
    ///
    /// `* PREAUTH` starts the session already authenticated.
    ///
    /// # Errors
    ///
    /// See [`Self::from_stream`].
    pub async fn from_stream_with_config(stream: S, config: FramerConfig) -> Result<Self> {
        let mut session = Self {
            framed: FramedStream::with_config(stream, config),
            tags: TagGenerator::default(),
            state: SessionState::NotAuthenticated,
            greeting: String::new(),
            capabilities: Vec::new(),
            mailbox: None,
            unsolicited: Vec::new(),
        };

        let (state, code, text) = match session.read_response(Stage::Greeting).await? {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => {
                (SessionState::NotAuthenticated, code, text)
            }
            Response::Untagged(UntaggedResponse::PreAuth { code, text }) => {
                (SessionState::Authenticated, code, text)
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::protocol(
                    Stage::Greeting,
                    format!("unexpected greeting: {other:?}"),
                ));
            }
        };

        if let Some(ResponseCode::Capability(caps)) = code {
            session.capabilities = caps;
        }
        debug!(greeting = %text, state = %state, "IMAP greeting");
        session.state = state;
        session.greeting = text;
        Ok(session)
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the greeting text.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Returns the capabilities learned so far.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns the selected mailbox's status.
    #[must_use]
    pub const fn mailbox(&self) -> Option<&MailboxStatus> {
        self.mailbox.as_ref()
    }

    /// Returns the untagged responses no command claimed.
    #[must_use]
    pub fn unsolicited(&self) -> &[UntaggedResponse] {
        &self.unsolicited
    }

    /// Drains the unsolicited buffer.
    pub fn take_unsolicited(&mut self) -> Vec<UntaggedResponse> {
        std::mem::take(&mut self.unsolicited)
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.framed.get_ref()
    }

    /// Consumes the session, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }

    /// Refreshes the capability list with `CAPABILITY`.
    ///
    /// # Errors
    ///
    /// Returns an error on `NO`/`BAD` or once the session has ended.
    pub async fn capability(&mut self) -> Result<&[Capability]> {
        let stage = Stage::Command("CAPABILITY");
        self.expect_live(stage)?;
        let next = self.state;
        let result = self
            .execute(&Command::Capability, |u, _| {
                matches!(u, UntaggedResponse::Capability(_))
            })
            .await;
        self.finish(result, next)?;
        Ok(&self.capabilities)
    }

    /// Sends `NOOP`, giving the server a chance to report changes.
    ///
    /// Whatever it reports lands in the unsolicited buffer.
    ///
    /// # Errors
    ///
    /// Returns an error on `NO`/`BAD` or once the session has ended.
    pub async fn noop(&mut self) -> Result<()> {
        let stage = Stage::Command("NOOP");
        self.expect_live(stage)?;
        let next = self.state;
        let result = self.execute(&Command::Noop, |_, _| false).await;
        self.finish(result, next).map(drop)
    }

    /// Logs in with `LOGIN`.
    ///
    /// Values that cannot travel as quoted strings are sent as
    /// synchronizing literals.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server answers `NO`.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.expect_state(Stage::Auth, &[SessionState::NotAuthenticated])?;
        let cmd = Command::Login {
            username: credentials.username().to_string(),
            password: credentials.secret().to_string(),
        };
        let result = self.execute(&cmd, |_, _| false).await;
        let completion = self.finish(result, SessionState::Authenticated)?;
        if let Some(ResponseCode::Capability(caps)) = completion.code {
            self.capabilities = caps;
        }
        debug!(username = credentials.username(), "logged in");
        Ok(())
    }

    /// Selects `mailbox` and returns its message count.
    ///
    /// The full status stays available through [`Self::mailbox`].
    ///
    /// # Errors
    ///
    /// Returns an error on `NO`/`BAD` (for example, no such mailbox).
    pub async fn select(&mut self, mailbox: &str) -> Result<u32> {
        self.expect_state(
            Stage::Command("SELECT"),
            &[SessionState::Authenticated, SessionState::Selected],
        )?;
        self.mailbox = None;

        let cmd = Command::Select {
            mailbox: mailbox.to_string(),
        };
        let result = self.execute(&cmd, |u, _| is_select_data(u)).await;
        let completion = self.finish(result, SessionState::Selected)?;

        let mut status = MailboxStatus::new(mailbox);
        for response in completion.untagged {
            apply_select_data(&mut status, response);
        }
        status.read_only = completion.code == Some(ResponseCode::ReadOnly);
        debug!(
            mailbox,
            exists = status.exists,
            read_only = status.read_only,
            "mailbox selected"
        );

        let exists = status.exists;
        self.mailbox = Some(status);
        Ok(exists)
    }

    /// Fetches `items` for the messages in `sequence`.
    ///
    /// Only FETCH responses for sequence numbers inside the set are
    /// returned; others go to the unsolicited buffer.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if no mailbox is selected, or on
    /// `NO`/`BAD`.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<Vec<MessageData>> {
        self.expect_state(Stage::Command("FETCH"), &[SessionState::Selected])?;

        let cmd = Command::Fetch {
            sequence: sequence.clone(),
            items,
        };
        let result = self
            .execute(&cmd, |u, exists| claims_fetch(u, sequence, exists))
            .await;
        let completion = self.finish(result, SessionState::Selected)?;

        Ok(completion
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Fetch { seq, items } => Some(MessageData { seq, items }),
                _ => None,
            })
            .collect())
    }

    /// Fetches and decodes the message with the highest sequence number,
    /// without setting `\Seen`.
    ///
    /// Returns `Ok(None)` if the mailbox is empty.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`]; also fails if the server returns no content for
    /// the message or the content cannot be decoded.
    pub async fn fetch_latest(&mut self) -> Result<Option<FetchedMessage>> {
        let stage = Stage::Command("FETCH");
        self.expect_state(stage, &[SessionState::Selected])?;
        let Some(last) = self.mailbox.as_ref().and_then(MailboxStatus::last) else {
            return Ok(None);
        };

        let data = self
            .fetch(&SequenceSet::Single(last), FetchItems::full_message())
            .await?;
        let message = data
            .iter()
            .find(|d| d.seq == last)
            .map(MessageData::message)
            .transpose()?
            .flatten();

        match message {
            Some(message) => Ok(Some(message)),
            None => Err(Error::protocol(
                stage,
                format!("no message content returned for {last}"),
            )),
        }
    }

    /// Sets (`value == true`) or clears `flag` on the messages in
    /// `sequence`, returning the flags the server reports afterwards.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if no mailbox is selected, or on
    /// `NO`/`BAD`.
    pub async fn store(
        &mut self,
        sequence: &SequenceSet,
        flag: Flag,
        value: bool,
    ) -> Result<Vec<(SeqNum, Flags)>> {
        self.expect_state(Stage::Command("STORE"), &[SessionState::Selected])?;

        let action = if value {
            StoreAction::AddFlags(vec![flag])
        } else {
            StoreAction::RemoveFlags(vec![flag])
        };
        let cmd = Command::Store {
            sequence: sequence.clone(),
            action,
        };
        let result = self
            .execute(&cmd, |u, exists| claims_fetch(u, sequence, exists))
            .await;
        let completion = self.finish(result, SessionState::Selected)?;

        Ok(completion
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Fetch { seq, items } => {
                    items.into_iter().find_map(|item| match item {
                        FetchItem::Flags(flags) => Some((seq, flags)),
                        _ => None,
                    })
                }
                _ => None,
            })
            .collect())
    }

    /// Removes messages flagged `\Deleted` with `EXPUNGE`.
    ///
    /// Returns the expunged sequence numbers in the order the server sent
    /// them; each one renumbers the messages after it.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if no mailbox is selected, or on
    /// `NO`/`BAD`.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        self.expect_state(Stage::Command("EXPUNGE"), &[SessionState::Selected])?;
        let result = self
            .execute(&Command::Expunge, |u, _| {
                matches!(u, UntaggedResponse::Expunge(_))
            })
            .await;
        let completion = self.finish(result, SessionState::Selected)?;

        let expunged: Vec<SeqNum> = completion
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Expunge(seq) => Some(seq),
                _ => None,
            })
            .collect();
        debug!(count = expunged.len(), "expunged");
        Ok(expunged)
    }

    /// Closes the selected mailbox with `CLOSE`, silently removing
    /// messages flagged `\Deleted`.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if no mailbox is selected, or on
    /// `NO`/`BAD`.
    pub async fn close(&mut self) -> Result<()> {
        self.expect_state(Stage::Command("CLOSE"), &[SessionState::Selected])?;
        let result = self.execute(&Command::Close, |_, _| false).await;
        self.finish(result, SessionState::Authenticated)?;
        self.mailbox = None;
        Ok(())
    }

    /// Ends the session with `LOGOUT`.
    ///
    /// # Errors
    ///
    /// Returns an error on `NO`/`BAD` or a lost connection. The session is
    /// over either way.
    pub async fn logout(&mut self) -> Result<()> {
        self.expect_live(Stage::Command("LOGOUT"))?;
        let result = self
            .execute(&Command::Logout, |u, _| matches!(u, UntaggedResponse::Bye { .. }))
            .await;
        self.mailbox = None;
        self.finish(result, SessionState::Logout).map(drop)
    }

    fn expect_state(&self, stage: Stage, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.state_error(stage))
        }
    }

    fn expect_live(&self, stage: Stage) -> Result<()> {
        if self.state.is_terminal() {
            Err(self.state_error(stage))
        } else {
            Ok(())
        }
    }

    fn state_error(&self, stage: Stage) -> Error {
        Error::Protocol {
            stage,
            text: format!("not allowed in state {}", self.state),
        }
    }

    fn finish<T>(&mut self, result: Result<T>, next: SessionState) -> Result<T> {
        match &result {
            Ok(_) => self.state = next,
            Err(err) => {
                warn!(error = %err, state = %self.state, "IMAP session failed");
                self.state = SessionState::Logout;
                self.mailbox = None;
            }
        }
        result
    }

    /// Sends `cmd` and reads until its tagged completion.
    ///
    /// `claim` decides, given the selected mailbox's message count, which
    /// untagged responses belong to this command. The rest go to the
    /// unsolicited buffer.
    async fn execute<F>(&mut self, cmd: &Command, claim: F) -> Result<Completion>
    where
        F: Fn(&UntaggedResponse, u32) -> bool,
    {
        let stage = stage_of(cmd);
        let tag = self.tags.next();
        debug!(command = %cmd.redacted(tag.as_str()), "C:");

        let parts = cmd.serialize(tag.as_str());
        let mut claimed = Vec::new();

        let mut parts = parts.iter().peekable();
        while let Some(part) = parts.next() {
            self.framed
                .write_raw(part)
                .await
                .map_err(|e| Error::from_wire(e, stage))?;

            let more = parts.peek().is_some();
            loop {
                match self.step(&tag, stage, &claim, &mut claimed, more).await? {
                    Step::Continuation => break,
                    Step::Routed => {}
                    Step::Done(status, code, text) => {
                        return complete(cmd, stage, status, code, text, claimed);
                    }
                }
            }
        }

        Err(Error::protocol(stage, "command ended without completion"))
    }

    /// Reads one response and routes it.
    async fn step<F>(
        &mut self,
        tag: &Tag,
        stage: Stage,
        claim: &F,
        claimed: &mut Vec<UntaggedResponse>,
        awaiting_continuation: bool,
    ) -> Result<Step>
    where
        F: Fn(&UntaggedResponse, u32) -> bool,
    {
        match self.read_response(stage).await? {
            Response::Tagged {
                tag: got,
                status,
                code,
                text,
            } => {
                if got == *tag {
                    Ok(Step::Done(status, code, text))
                } else {
                    Err(Error::protocol(
                        stage,
                        format!("completion for unknown tag {got} while waiting for {tag}"),
                    ))
                }
            }
            Response::Continuation { .. } if awaiting_continuation => Ok(Step::Continuation),
            Response::Continuation { text } => Err(Error::protocol(
                stage,
                format!("unexpected continuation: {}", text.unwrap_or_default()),
            )),
            Response::Untagged(response) => {
                self.track(&response);
                let exists = self.mailbox.as_ref().map_or(0, |m| m.exists);
                if claim(&response, exists) {
                    claimed.push(response);
                } else if let UntaggedResponse::Bye { text, .. } = response {
                    return Err(Error::Bye(text));
                } else {
                    self.absorb(response);
                }
                Ok(Step::Routed)
            }
        }
    }

    /// Keeps the selected mailbox's counts and the capability list current.
    ///
    /// Runs for every untagged response, claimed or not.
    fn track(&mut self, response: &UntaggedResponse) {
        match response {
            UntaggedResponse::Exists(n) => {
                if let Some(mailbox) = self.mailbox.as_mut() {
                    mailbox.exists = *n;
                }
            }
            UntaggedResponse::Recent(n) => {
                if let Some(mailbox) = self.mailbox.as_mut() {
                    mailbox.recent = *n;
                }
            }
            UntaggedResponse::Expunge(_) => {
                if let Some(mailbox) = self.mailbox.as_mut() {
                    mailbox.exists = mailbox.exists.saturating_sub(1);
                }
            }
            UntaggedResponse::Capability(caps)
            | UntaggedResponse::Ok {
                code: Some(ResponseCode::Capability(caps)),
                ..
            } => self.capabilities.clone_from(caps),
            _ => {}
        }
    }

    /// Buffers untagged data no command claimed.
    fn absorb(&mut self, response: UntaggedResponse) {
        if response.is_alert() {
            warn!(response = ?response, "server alert");
        }
        debug!(response = ?response, "unsolicited");
        self.unsolicited.push(response);
    }

    /// Reads one complete response, literals included.
    ///
    /// A line ending in `{n}` is followed by exactly `n` raw bytes and then
    /// more of the same response, so reading alternates between line mode
    /// and byte-count mode until a line ends without a literal.
    async fn read_response(&mut self, stage: Stage) -> Result<Response> {
        let mut raw = Vec::new();

        loop {
            let line = self
                .framed
                .read_line()
                .await
                .map_err(|e| Error::from_wire(e, stage))?;
            raw.extend_from_slice(&line);
            raw.extend_from_slice(b"\r\n");

            let Some(len) = literal_length(&line) else {
                break;
            };
            let literal = self
                .framed
                .read_literal(len)
                .await
                .map_err(|e| Error::from_wire(e, stage))?;
            raw.extend_from_slice(&literal);
        }

        trace!(response = %String::from_utf8_lossy(&raw).trim_end(), "S:");
        ResponseParser::parse(&raw)
    }
}

fn stage_of(cmd: &Command) -> Stage {
    match cmd {
        Command::Login { .. } => Stage::Auth,
        other => Stage::Command(other.name()),
    }
}

/// Maps a tagged status to the command's outcome.
fn complete(
    cmd: &Command,
    stage: Stage,
    status: Status,
    code: Option<ResponseCode>,
    text: String,
    untagged: Vec<UntaggedResponse>,
) -> Result<Completion> {
    match status {
        Status::Ok => Ok(Completion { code, untagged }),
        Status::No if matches!(cmd, Command::Login { .. }) => Err(Error::Auth(text)),
        other => Err(Error::protocol(stage, format!("{other} {text}"))),
    }
}

/// Returns the length announced by a trailing `{n}` or `{n+}`.
fn literal_length(line: &[u8]) -> Option<usize> {
    let body = line.strip_suffix(b"}")?;
    let open = body.iter().rposition(|&b| b == b'{')?;
    let digits = &body[open + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn is_select_data(response: &UntaggedResponse) -> bool {
    match response {
        UntaggedResponse::Exists(_)
        | UntaggedResponse::Recent(_)
        | UntaggedResponse::Flags(_) => true,
        UntaggedResponse::Ok { code, .. } => matches!(
            code,
            Some(
                ResponseCode::Unseen(_)
                    | ResponseCode::UidNext(_)
                    | ResponseCode::UidValidity(_)
                    | ResponseCode::PermanentFlags(_)
            )
        ),
        _ => false,
    }
}

fn apply_select_data(status: &mut MailboxStatus, response: UntaggedResponse) {
    match response {
        UntaggedResponse::Exists(n) => status.exists = n,
        UntaggedResponse::Recent(n) => status.recent = n,
        UntaggedResponse::Flags(flags) => status.flags = flags,
        UntaggedResponse::Ok { code: Some(code), .. } => match code {
            ResponseCode::Unseen(seq) => status.unseen = Some(seq),
            ResponseCode::UidNext(uid) => status.uid_next = Some(uid),
            ResponseCode::UidValidity(v) => status.uid_validity = Some(v),
            ResponseCode::PermanentFlags(flags) => {
                status.permanent_flags = flags.into_iter().collect();
            }
            _ => {}
        },
        _ => {}
    }
}

fn claims_fetch(response: &UntaggedResponse, sequence: &SequenceSet, exists: u32) -> bool {
    matches!(response, UntaggedResponse::Fetch { seq, .. } if sequence.contains(*seq, exists))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use std::time::Duration;

    use tokio_test::io::Builder;

    use super::*;

    const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 IDLE] ready\r\n";

    fn creds() -> Credentials {
        Credentials::new("probe@example.com", "secret")
    }

    fn seq(n: u32) -> SeqNum {
        SeqNum::new(n).unwrap()
    }

    /// Mock that greets, accepts LOGIN as A0000 and SELECT INBOX as A0001.
    fn selected(exists: u32) -> Builder {
        let mut builder = Builder::new();
        builder
            .read(GREETING)
            .write(b"A0000 LOGIN probe@example.com secret\r\n")
            .read(b"A0000 OK LOGIN completed\r\n")
            .write(b"A0001 SELECT INBOX\r\n")
            .read(format!("* {exists} EXISTS\r\n").as_bytes())
            .read(b"* 0 RECENT\r\n")
            .read(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
            .read(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n")
            .read(b"* OK [UIDNEXT 4392] Predicted next UID\r\n")
            .read(b"A0001 OK [READ-WRITE] SELECT completed\r\n");
        builder
    }

    async fn open<S: AsyncRead + AsyncWrite + Unpin>(stream: S) -> ImapSession<S> {
        let mut session = ImapSession::from_stream(stream).await.unwrap();
        session.login(&creds()).await.unwrap();
        session.select("INBOX").await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_greeting_capabilities() {
        let mock = Builder::new().read(GREETING).build();
        let session = ImapSession::from_stream(mock).await.unwrap();
        assert_eq!(session.state(), SessionState::NotAuthenticated);
        assert_eq!(session.greeting(), "ready");
        assert!(session.capabilities().contains(&Capability::Idle));
    }

    #[tokio::test]
    async fn test_preauth_greeting() {
        let mock = Builder::new().read(b"* PREAUTH welcome back\r\n").build();
        let session = ImapSession::from_stream(mock).await.unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_bye_greeting() {
        let mock = Builder::new().read(b"* BYE too many connections\r\n").build();
        let err = ImapSession::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Bye(text) if text == "too many connections"));
    }

    #[tokio::test]
    async fn test_login_and_select() {
        let mock = selected(2).build();
        let mut session = ImapSession::from_stream(mock).await.unwrap();
        session.login(&creds()).await.unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);

        let exists = session.select("INBOX").await.unwrap();
        assert_eq!(exists, 2);
        assert_eq!(session.state(), SessionState::Selected);

        let mailbox = session.mailbox().unwrap();
        assert_eq!(mailbox.name, "INBOX");
        assert_eq!(mailbox.uid_validity.unwrap().get(), 3857529045);
        assert_eq!(mailbox.uid_next.unwrap().get(), 4392);
        assert!(mailbox.flags.contains(&Flag::Deleted));
        assert!(!mailbox.read_only);
        assert!(session.unsolicited().is_empty());
    }

    #[tokio::test]
    async fn test_login_with_literal_waits_for_continuation() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN probe {6}\r\n")
            .read(b"+ Ready for literal data\r\n")
            .write("naïve\r\n".as_bytes())
            .read(b"A0000 OK [CAPABILITY IMAP4rev1 UIDPLUS] LOGIN completed\r\n")
            .build();
        let mut session = ImapSession::from_stream(mock).await.unwrap();
        session
            .login(&Credentials::new("probe", "naïve"))
            .await
            .unwrap();
        assert!(
            session
                .capabilities()
                .contains(&Capability::Other("UIDPLUS".into()))
        );
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN probe@example.com secret\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .build();
        let mut session = ImapSession::from_stream(mock).await.unwrap();
        let err = session.login(&creds()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(ref text) if text == "Invalid credentials"));
        assert_eq!(session.state(), SessionState::Logout);
    }

    #[tokio::test]
    async fn test_fetch_before_select_is_rejected() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN probe@example.com secret\r\n")
            .read(b"A0000 OK done\r\n")
            .build();
        let mut session = ImapSession::from_stream(mock).await.unwrap();
        session.login(&creds()).await.unwrap();

        let err = session
            .fetch(&SequenceSet::single(1).unwrap(), FetchItems::Fast)
            .await
            .unwrap_err();
        match err {
            Error::Protocol { stage, text } => {
                assert_eq!(stage, Stage::Command("FETCH"));
                assert!(text.contains("authenticated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_fetch_literal_body() {
        let mock = selected(1)
            .write(b"A0002 FETCH 1 (UID FLAGS RFC822.SIZE BODY.PEEK[])\r\n")
            .read(b"* 1 FETCH (UID 7 FLAGS () RFC822.SIZE 11 BODY[] {11}\r\n")
            .read(b"HELLO\r\nWORL")
            .read(b")\r\n")
            .read(b"A0002 OK FETCH completed\r\n")
            .build();
        let mut session = open(mock).await;

        let data = session
            .fetch(&SequenceSet::single(1).unwrap(), FetchItems::full_message())
            .await
            .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].seq, seq(1));
        assert_eq!(data[0].uid().unwrap().get(), 7);
        assert_eq!(data[0].body(None), Some(&b"HELLO\r\nWORL"[..]));
    }

    #[tokio::test]
    async fn test_fetch_latest_decodes_message() {
        let message = "Subject: Test email subject: 1700000000000\r\n\r\nTest email text: 1700000000000\r\n";
        let mock = selected(2)
            .write(b"A0002 FETCH 2 (UID FLAGS RFC822.SIZE BODY.PEEK[])\r\n")
            .read(format!("* 2 FETCH (UID 9 BODY[] {{{}}}\r\n", message.len()).as_bytes())
            .read(message.as_bytes())
            .read(b" FLAGS ())\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut session = open(mock).await;

        let fetched = session.fetch_latest().await.unwrap().unwrap();
        assert_eq!(fetched.subject, "Test email subject: 1700000000000");
        assert_eq!(fetched.body, "Test email text: 1700000000000");
        assert_eq!(fetched.sequence, Some(2));
    }

    #[tokio::test]
    async fn test_fetch_latest_empty_mailbox() {
        let mut session = open(selected(0).build()).await;
        assert!(session.fetch_latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unrelated_untagged_data_is_buffered() {
        let mock = selected(1)
            .write(b"A0002 FETCH 1 FAST\r\n")
            .read(b"* 2 EXISTS\r\n")
            .read(b"* 2 FETCH (FLAGS (\\Recent))\r\n")
            .read(b"* OK [ALERT] Maintenance at noon\r\n")
            .read(b"* 1 FETCH (FLAGS (\\Seen) RFC822.SIZE 42)\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut session = open(mock).await;

        let data = session
            .fetch(&SequenceSet::single(1).unwrap(), FetchItems::Fast)
            .await
            .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].size(), Some(42));

        assert_eq!(session.mailbox().unwrap().exists, 2);
        let unsolicited = session.take_unsolicited();
        assert_eq!(unsolicited.len(), 3);
        assert_eq!(unsolicited[0], UntaggedResponse::Exists(2));
        assert!(matches!(unsolicited[1], UntaggedResponse::Fetch { seq: s, .. } if s == seq(2)));
        assert!(unsolicited[2].is_alert());
        assert!(session.unsolicited().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_tag_is_protocol_error() {
        let mock = selected(1)
            .write(b"A0002 NOOP\r\n")
            .read(b"A0009 OK stray\r\n")
            .build();
        let mut session = open(mock).await;

        let err = session.noop().await.unwrap_err();
        assert!(matches!(err, Error::Protocol { ref text, .. } if text.contains("A0009")));
        assert_eq!(session.state(), SessionState::Logout);
    }

    #[tokio::test]
    async fn test_unexpected_continuation() {
        let mock = selected(1)
            .write(b"A0002 NOOP\r\n")
            .read(b"+ go ahead\r\n")
            .build();
        let mut session = open(mock).await;
        assert!(matches!(
            session.noop().await,
            Err(Error::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_expunge_close_logout() {
        let mock = selected(3)
            .write(b"A0002 STORE 3 +FLAGS (\\Deleted)\r\n")
            .read(b"* 3 FETCH (FLAGS (\\Seen \\Deleted))\r\n")
            .read(b"A0002 OK STORE completed\r\n")
            .write(b"A0003 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n")
            .read(b"A0003 OK EXPUNGE completed\r\n")
            .write(b"A0004 CLOSE\r\n")
            .read(b"A0004 OK CLOSE completed\r\n")
            .write(b"A0005 LOGOUT\r\n")
            .read(b"* BYE logging out\r\n")
            .read(b"A0005 OK LOGOUT completed\r\n")
            .build();
        let mut session = open(mock).await;

        let updated = session
            .store(&SequenceSet::single(3).unwrap(), Flag::Deleted, true)
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, seq(3));
        assert!(updated[0].1.is_deleted());

        let expunged = session.expunge().await.unwrap();
        assert_eq!(expunged, vec![seq(3)]);
        assert_eq!(session.mailbox().unwrap().exists, 2);

        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
        assert!(session.mailbox().is_none());

        session.logout().await.unwrap();
        assert_eq!(session.state(), SessionState::Logout);
        assert!(session.unsolicited().is_empty());
    }

    #[tokio::test]
    async fn test_store_clears_flag() {
        let mock = selected(1)
            .write(b"A0002 STORE 1 -FLAGS (\\Seen)\r\n")
            .read(b"* 1 FETCH (FLAGS ())\r\n")
            .read(b"A0002 OK done\r\n")
            .build();
        let mut session = open(mock).await;
        let updated = session
            .store(&SequenceSet::single(1).unwrap(), Flag::Seen, false)
            .await
            .unwrap();
        assert!(updated[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_tagged_no_is_protocol_error() {
        let mock = selected(1)
            .write(b"A0002 EXPUNGE\r\n")
            .read(b"A0002 NO [READ-ONLY] mailbox is read-only\r\n")
            .build();
        let mut session = open(mock).await;
        match session.expunge().await.unwrap_err() {
            Error::Protocol { stage, text } => {
                assert_eq!(stage, Stage::Command("EXPUNGE"));
                assert_eq!(text, "NO mailbox is read-only");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsolicited_bye_ends_session() {
        let mock = selected(1)
            .write(b"A0002 NOOP\r\n")
            .read(b"* BYE server shutting down\r\n")
            .build();
        let mut session = open(mock).await;
        let err = session.noop().await.unwrap_err();
        assert!(matches!(err, Error::Bye(_)));
        assert!(matches!(
            session.noop().await,
            Err(Error::Protocol { ref text, .. }) if text.contains("logout")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_ends_session() {
        let (client, mut server) = tokio::io::duplex(1024);
        tokio::io::AsyncWriteExt::write_all(&mut server, GREETING)
            .await
            .unwrap();

        let config = FramerConfig::default().io_timeout(Some(Duration::from_secs(5)));
        let mut session = ImapSession::from_stream_with_config(client, config)
            .await
            .unwrap();

        let err = session.noop().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(5)));
        assert_eq!(session.state(), SessionState::Logout);
        drop(server);
    }

    #[test]
    fn test_literal_length() {
        assert_eq!(literal_length(b"* 1 FETCH (BODY[] {123}"), Some(123));
        assert_eq!(literal_length(b"A0001 LOGIN {5+}"), Some(5));
        assert_eq!(literal_length(b"{0}"), Some(0));
        assert_eq!(literal_length(b"no literal"), None);
        assert_eq!(literal_length(b"* OK {abc}"), None);
        assert_eq!(literal_length(b"* OK {}"), None);
    }
}
