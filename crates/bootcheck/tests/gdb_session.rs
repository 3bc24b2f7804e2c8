//! End-to-end checks against an in-process fake GDB stub.

use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bootcheck::gdb::packet::{encode, read_packet};
use bootcheck::{
    CheckConfig, CheckOutcome, DebugSession, Error, GdbSession, RegisterFile, SessionConfig,
    SessionError, TraceConfig, check,
};
use tempfile::NamedTempFile;

/// What the stub does once its register script runs out.
#[derive(Clone, Copy)]
enum Ending {
    Exit,
    Hang,
}

/// Bytes the free-running CPU advances per handled packet.
const FREE_RUN_STEP: u16 = 3;

/// Minimal SM83 stub: every `c` advances to the next scripted register state.
///
/// Like the emulator's stub, the CPU starts running once `qAttached` is
/// handled and keeps running until a `?` halts it.
struct FakeStub {
    states: Vec<RegisterFile>,
    ending: Ending,
}

impl FakeStub {
    fn new(states: Vec<RegisterFile>) -> Self {
        Self {
            states,
            ending: Ending::Exit,
        }
    }

    fn ending(mut self, ending: Ending) -> Self {
        self.ending = ending;
        self
    }

    /// Listen on an ephemeral port and serve one connection.
    fn spawn(self) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            self.serve(stream)
        });
        (endpoint, handle)
    }

    fn serve(self, stream: TcpStream) -> Vec<String> {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut received = Vec::new();
        let mut current = RegisterFile::new();
        let mut script = self.states.into_iter();
        let mut attached = false;
        let mut halted = false;

        while let Ok(packet) = read_packet(&mut reader) {
            let _ = writer.write_all(b"+");
            received.push(packet.clone());
            if attached && !halted {
                current.pc = current.pc.wrapping_add(FREE_RUN_STEP);
            }

            let reply = match packet.as_str() {
                "qSupported:hwbreak+;" => Some("PacketSize=1000;hwbreak+".to_string()),
                "qAttached" => {
                    attached = true;
                    Some("1".to_string())
                }
                "?" => {
                    halted = true;
                    Some("S05".to_string())
                }
                "g" => Some(encode_registers(&current)),
                "c" => match (script.next(), self.ending) {
                    (Some(next), _) => {
                        current = next;
                        halted = true;
                        Some("S05".to_string())
                    }
                    (None, Ending::Exit) => Some("W00".to_string()),
                    (None, Ending::Hang) => None,
                },
                "D" => {
                    let _ = writer.write_all(encode("OK").as_bytes());
                    break;
                }
                p if p.starts_with("Z1,") || p.starts_with("z1,") => Some("OK".to_string()),
                _ => Some(String::new()),
            };
            if let Some(reply) = reply {
                let _ = writer.write_all(encode(&reply).as_bytes());
            }
        }
        received
    }
}

fn encode_registers(regs: &RegisterFile) -> String {
    let mut out: String = [regs.af, regs.bc, regs.de, regs.hl, regs.sp, regs.pc]
        .iter()
        .map(|value| format!("{:04x}", value.swap_bytes()))
        .collect();
    out.push_str(&"x".repeat(28));
    out
}

fn state(af: u16, pc: u16) -> RegisterFile {
    RegisterFile {
        af,
        sp: 0xfffe,
        pc,
        ..RegisterFile::new()
    }
}

fn trace_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn config(trace: &NamedTempFile, endpoint: String) -> CheckConfig {
    CheckConfig {
        endpoint,
        ..CheckConfig::new(trace.path())
    }
}

const TRACE: &str = "af:0000,bc:0000,de:0000,hl:0000,sp:fffe,pc:0000\npc:0100,af:01b0\n";

#[test]
fn test_full_boot_check_passes() {
    let (endpoint, stub) = FakeStub::new(vec![state(0x0000, 0x0000), state(0x01b0, 0x0100)]).spawn();
    let trace = trace_file(TRACE);

    let outcome = check(GdbSession::new(), &config(&trace, endpoint)).unwrap();
    assert_eq!(outcome, CheckOutcome::Passed { compared: 2 });

    let received = stub.join().unwrap();
    assert_eq!(
        received,
        vec![
            "qSupported:hwbreak+;",
            "?",
            "qAttached",
            "Z1,0,1",
            "c",
            "z1,0,1",
            "g",
            "Z1,100,1",
            "c",
            "z1,100,1",
            "g",
            "D",
        ]
    );
}

#[test]
fn test_register_mismatch_is_reported() {
    let (endpoint, stub) = FakeStub::new(vec![state(0x0000, 0x0000), state(0x0080, 0x0100)]).spawn();
    let trace = trace_file(TRACE);

    let outcome = check(GdbSession::new(), &config(&trace, endpoint)).unwrap();
    let CheckOutcome::Failed(mismatch) = outcome else {
        panic!("expected a mismatch");
    };
    assert_eq!(mismatch.step, 2);
    assert_eq!(mismatch.live.af, 0x0080);
    assert_eq!(mismatch.golden.af, 0x01b0);
    assert_eq!(mismatch.live.pc, 0x0100);

    // The session is dropped without a detach.
    let received = stub.join().unwrap();
    assert!(!received.iter().any(|p| p == "D"));
}

#[test]
fn test_target_exit_fails_the_run() {
    let (endpoint, stub) = FakeStub::new(vec![state(0x0000, 0x0000)]).spawn();
    let trace = trace_file(TRACE);

    let result = check(GdbSession::new(), &config(&trace, endpoint));
    assert!(matches!(
        result,
        Err(Error::Session(SessionError::TargetExited(0)))
    ));
    stub.join().unwrap();
}

#[test]
fn test_resume_timeout() {
    let (endpoint, stub) = FakeStub::new(Vec::new()).ending(Ending::Hang).spawn();
    let trace = trace_file(TRACE);
    let mut config = config(&trace, endpoint);
    config.session.resume_timeout = Some(Duration::from_millis(200));

    let result = check(GdbSession::new(), &config);
    assert!(matches!(
        result,
        Err(Error::Session(SessionError::Timeout(limit))) if limit == Duration::from_millis(200)
    ));
    stub.join().unwrap();
}

#[test]
fn test_skip_and_cap_limit_breakpoints() {
    // sp is only set by the skipped first record.
    let live = RegisterFile {
        af: 0x01b0,
        pc: 0x0100,
        ..RegisterFile::new()
    };
    let (endpoint, stub) = FakeStub::new(vec![live]).spawn();
    let trace = trace_file(&format!("{TRACE}pc:0101\n"));
    let config = CheckConfig {
        trace: TraceConfig::new(1, Some(1)),
        ..config(&trace, endpoint)
    };

    let outcome = check(GdbSession::new(), &config).unwrap();
    assert_eq!(outcome, CheckOutcome::Passed { compared: 1 });

    let breakpoints: Vec<_> = stub
        .join()
        .unwrap()
        .into_iter()
        .filter(|p| p.starts_with("Z1,"))
        .collect();
    assert_eq!(breakpoints, vec!["Z1,100,1"]);
}

#[test]
fn test_session_dump_reads_as_register_text() {
    let (endpoint, stub) = FakeStub::new(vec![state(0x01b0, 0x0100)]).spawn();

    let mut session = GdbSession::new();
    session.configure(&SessionConfig::default()).unwrap();
    session.attach(&endpoint).unwrap();
    session.set_temporary_breakpoint(0x0100).unwrap();
    session.resume().unwrap();
    let dump = session.dump_registers().unwrap();
    session.disconnect().unwrap();
    assert!(!session.is_attached());

    let mut live = RegisterFile::new();
    live.update_from_freeform_dump(&dump).unwrap();
    assert_eq!(live, state(0x01b0, 0x0100));
    stub.join().unwrap();
}

#[test]
fn test_connect_refused() {
    let endpoint = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let mut session = GdbSession::new();
    assert!(matches!(
        session.attach(&endpoint),
        Err(SessionError::Connect { .. })
    ));
}

#[test]
fn test_attach_halts_cpu_at_reset() {
    let (endpoint, stub) = FakeStub::new(Vec::new()).spawn();

    let mut session = GdbSession::new();
    session.configure(&SessionConfig::default()).unwrap();
    session.attach(&endpoint).unwrap();
    let dump = session.dump_registers().unwrap();
    session.disconnect().unwrap();

    let mut live = RegisterFile::new();
    live.update_from_freeform_dump(&dump).unwrap();
    assert_eq!(live.pc, 0x0000);

    let received = stub.join().unwrap();
    let halt = received.iter().position(|p| p == "?").unwrap();
    let attach = received.iter().position(|p| p == "qAttached").unwrap();
    assert!(halt < attach, "halt must precede qAttached: {received:?}");
}
