//! In-process fake OLT for exercising the facade over real TCP.
//!
//! The fake speaks just enough of the AN6000 CLI: the login and `enable`
//! dialogue, then one reply per command line, each ending with the
//! privileged prompt. Replies come from a responder closure; the server
//! echoes the command, prints the reply with `\r\n` line endings and
//! prompts again.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::device::An6k17;
use crate::driver::SessionOptions;
use crate::inventory::DeviceInfo;

type Responder = Arc<dyn Fn(&str) -> String + Send + Sync>;

const PROMPT: &str = "Admin# ";

/// Prompts of the login dialogue, each answered by one line.
const LOGIN_DIALOGUE: [&str; 4] = ["\r\nLogin: ", "Password: ", "\r\nUser> ", "Password: "];

pub(crate) struct FakeOlt {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FakeOlt {
    pub(crate) async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let _ = env_logger::builder().is_test(true).try_init();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let responder: Responder = Arc::new(responder);

        let log = commands.clone();
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let responder = responder.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let _ = serve(socket, responder, log).await;
                });
            }
        });

        Self {
            addr,
            commands,
            task,
        }
    }

    pub(crate) fn device(&self) -> DeviceInfo {
        DeviceInfo::new("127.0.0.1", "admin", "secret").with_port(self.addr.port())
    }

    pub(crate) fn olt(&self) -> An6k17 {
        An6k17::new(self.device()).with_options(fast_options())
    }

    /// Every command received after login, across all sessions.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Received commands minus pagination, view changes and `show`s.
    pub(crate) fn changes(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| {
                c != "terminal length 0"
                    && c != "config"
                    && c != "igmp"
                    && !c.starts_with("interface ")
                    && !c.starts_with("show ")
            })
            .collect()
    }
}

impl Drop for FakeOlt {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn fast_options() -> SessionOptions {
    SessionOptions {
        read_interval: Duration::from_millis(10),
        handshake_timeout: Duration::from_secs(5),
        command_timeout: Duration::from_secs(5),
        search_depth: 1000,
    }
}

async fn serve(
    socket: TcpStream,
    responder: Responder,
    log: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let (read, mut write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();

    for prompt in LOGIN_DIALOGUE {
        write.write_all(prompt.as_bytes()).await?;
        if lines.next_line().await?.is_none() {
            return Ok(());
        }
    }
    write.write_all(format!("\r\n{}", PROMPT).as_bytes()).await?;

    while let Some(line) = lines.next_line().await? {
        let command = line.trim().to_string();
        if command.is_empty() {
            write.write_all(format!("\r\n{}", PROMPT).as_bytes()).await?;
            continue;
        }
        log.lock().unwrap().push(command.clone());

        let body = responder(&command);
        let mut reply = format!("{}\r\n", command);
        let body = body.trim_end_matches('\n');
        if !body.is_empty() {
            reply.push_str(&body.replace('\n', "\r\n"));
            reply.push_str("\r\n");
        }
        reply.push_str(PROMPT);
        write.write_all(reply.as_bytes()).await?;
    }
    Ok(())
}

/// `show authorization` for the given `(slot, pon, onu, state, phy_id)`
/// rows, laid out the way the device prints it.
pub(crate) fn authorization_table(rows: &[(u32, u32, u32, &str, &str)]) -> String {
    let mut text = String::from(
        "-----  ONU Auth Table, SLOT = 4, PON = 8, ITEM = 2 -----\n\
         Slot Pon Onu OnuType        ST Lic OST PhyId        PhyPwd     LogicId                  LogicPwd\n\
         ---- --- --- -------------- -- --- --- ------------ ---------- ------------------------ ------------\n",
    );
    for (slot, pon, onu, state, phy_id) in rows {
        text.push_str(&format!(
            "{:<4} {:<3} {:<3} {:<14} {:<2} {:<3} {:<3} {:<12}\n",
            slot, pon, onu, "HG6243C", "A", 0, state, phy_id
        ));
    }
    text
}

/// `show discovery` listing `(phy_id, phy_pwd, logic_id, logic_pwd)` on 4/8.
pub(crate) fn discovery_table(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut text = String::from(
        "----- ONU Unauth Table, SLOT = 4, PON = 8, ITEM = 1 -----\n\
         No  OnuType        PhyId        PhyPwd     LogicId                  LogicPwd     Why\n\
         --- -------------- ------------ ---------- ------------------------ ------------ ---\n",
    );
    for (no, (phy_id, phy_pwd, logic_id, logic_pwd)) in rows.iter().enumerate() {
        text.push_str(&format!(
            "{:<3} {:<14} {:<12} {:<10} {:<24} {:<12} {:<3}\n",
            no + 1,
            "HG6243C",
            phy_id,
            phy_pwd,
            logic_id,
            logic_pwd,
            1
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    #[test]
    fn test_tables_parse() {
        let auth = extract::authorization(&authorization_table(&[
            (4, 8, 1, "up", "FHTT033178b0"),
            (4, 8, 2, "dn", "FHTT92f445c8"),
        ]));
        assert_eq!(auth.len(), 2);
        assert_eq!(auth[1].int("Onu"), Some(2));
        assert_eq!(auth[1].text("OST"), Some("dn"));
        assert_eq!(auth[1].text("PhyId"), Some("FHTT92f445c8"));

        let found = extract::discovery(&discovery_table(&[(
            "FHTT91fbc5e8",
            "fiberhome",
            "fh_logic",
            "12345",
        )]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text("PhyPwd"), Some("fiberhome"));
        assert_eq!(found[0].text("LogicId"), Some("fh_logic"));
        assert_eq!(found[0].int("SLOT"), Some(4));
    }
}
