//! Session tests against an in-process maildrop that honours RFC 1939
//! deletion semantics.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use mailloop_pop3::{Pop3Session, SessionState};
use mailloop_wire::Credentials;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

type Maildrop = Arc<Mutex<Vec<String>>>;

/// Serves `maildrop` over one end of a duplex pipe until QUIT or EOF.
///
/// DELE only marks; marked messages are removed when QUIT arrives.
fn serve(stream: DuplexStream, maildrop: Maildrop) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut lines = BufReader::new(reader).lines();
        let mut marked: Vec<usize> = Vec::new();

        writer.write_all(b"+OK fake maildrop ready\r\n").await.unwrap();

        while let Ok(Some(line)) = lines.next_line().await {
            let (verb, arg) = line.split_once(' ').unwrap_or((line.as_str(), ""));
            let reply = match verb {
                "USER" => "+OK\r\n".to_string(),
                "PASS" if arg == "secret" => "+OK logged in\r\n".to_string(),
                "PASS" => "-ERR bad password\r\n".to_string(),
                "STAT" => {
                    let store = maildrop.lock().unwrap();
                    let live: Vec<_> = store
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !marked.contains(i))
                        .collect();
                    let size: usize = live.iter().map(|(_, m)| m.len()).sum();
                    format!("+OK {} {size}\r\n", live.len())
                }
                "RETR" => {
                    let index = arg.parse::<usize>().unwrap() - 1;
                    let store = maildrop.lock().unwrap();
                    match store.get(index) {
                        Some(message) if !marked.contains(&index) => {
                            let mut reply = format!("+OK {} octets\r\n", message.len());
                            for part in message.split_inclusive("\r\n") {
                                if part.starts_with('.') {
                                    reply.push('.');
                                }
                                reply.push_str(part);
                            }
                            reply.push_str(".\r\n");
                            reply
                        }
                        _ => "-ERR no such message\r\n".to_string(),
                    }
                }
                "DELE" => {
                    marked.push(arg.parse::<usize>().unwrap() - 1);
                    "+OK marked\r\n".to_string()
                }
                "RSET" => {
                    marked.clear();
                    "+OK\r\n".to_string()
                }
                "QUIT" => {
                    {
                        let mut store = maildrop.lock().unwrap();
                        let mut index = 0;
                        store.retain(|_| {
                            let keep = !marked.contains(&index);
                            index += 1;
                            keep
                        });
                    }
                    writer.write_all(b"+OK bye\r\n").await.unwrap();
                    return;
                }
                _ => "-ERR unknown command\r\n".to_string(),
            };
            writer.write_all(reply.as_bytes()).await.unwrap();
        }
    })
}

fn maildrop() -> Maildrop {
    Arc::new(Mutex::new(vec![
        "Subject: older\r\n\r\nfirst\r\n".to_string(),
        "Subject: Test email subject: 1700000000000\r\n\r\nTest email text: 1700000000000\r\n.\r\n.hidden\r\n"
            .to_string(),
    ]))
}

async fn logged_in(maildrop: &Maildrop) -> (Pop3Session<DuplexStream>, JoinHandle<()>) {
    let (client, server) = tokio::io::duplex(4096);
    let handle = serve(server, Arc::clone(maildrop));
    let mut session = Pop3Session::from_stream(client).await.unwrap();
    session
        .login(&Credentials::new("probe@example.com", "secret"))
        .await
        .unwrap();
    (session, handle)
}

#[tokio::test]
async fn test_latest_message_round_trip() {
    let store = maildrop();
    let (mut session, handle) = logged_in(&store).await;

    let count = session.list_messages().await.unwrap();
    assert_eq!(count, 2);

    let message = session.fetch_message(count).await.unwrap();
    assert_eq!(message.subject, "Test email subject: 1700000000000");
    assert_eq!(message.body, "Test email text: 1700000000000\n.\n.hidden");
    assert_eq!(message.sequence, Some(2));

    session.quit().await.unwrap();
    handle.await.unwrap();
    assert_eq!(store.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_deletion_needs_quit() {
    let store = maildrop();
    let (mut session, handle) = logged_in(&store).await;

    session.mark_deleted(2).await.unwrap();
    drop(session);
    handle.await.unwrap();

    assert_eq!(store.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_deletion_committed_by_quit() {
    let store = maildrop();
    let (mut session, handle) = logged_in(&store).await;

    session.mark_deleted(2).await.unwrap();
    assert_eq!(session.list_messages().await.unwrap(), 1);
    session.quit().await.unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    handle.await.unwrap();

    let remaining = store.lock().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].contains("older"));
}

#[tokio::test]
async fn test_reset_unmarks() {
    let store = maildrop();
    let (mut session, handle) = logged_in(&store).await;

    session.mark_deleted(1).await.unwrap();
    session.reset().await.unwrap();
    session.quit().await.unwrap();
    handle.await.unwrap();

    assert_eq!(store.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejected_password() {
    let store = maildrop();
    let (client, server) = tokio::io::duplex(4096);
    let _handle = serve(server, Arc::clone(&store));
    let mut session = Pop3Session::from_stream(client).await.unwrap();

    let err = session
        .login(&Credentials::new("probe@example.com", "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, mailloop_pop3::Error::Auth(_)));
    assert_eq!(session.state(), SessionState::Closed);
}
