#![cfg(unix)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use atlink_modem::{CommandInterface, ModemConfig, ModemError, VirtualModem};

const WAIT: Duration = Duration::from_secs(2);

fn started(configure: impl FnOnce(&mut CommandInterface)) -> (VirtualModem, CommandInterface) {
    started_with(ModemConfig::with_line_timeout(WAIT), configure)
}

fn started_with(
    config: ModemConfig,
    configure: impl FnOnce(&mut CommandInterface),
) -> (VirtualModem, CommandInterface) {
    let (modem, connector) = VirtualModem::new().expect("virtual modem");
    let mut iface = CommandInterface::with_config(connector, config);
    configure(&mut iface);
    iface.start().expect("start");
    (modem, iface)
}

fn collect(iface: &CommandInterface, command: &str) -> (Result<(), ModemError>, Vec<String>) {
    let mut lines = Vec::new();
    let result = iface.transact_with(command, |line| {
        lines.push(line.to_string());
        Ok(())
    });
    (result, lines)
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, captured.text())
}

#[test]
fn imsi_reply_reaches_callback_once() {
    let (modem, iface) = started(|_| {});
    modem.respond("AT+CIMI", "204080813324647\r\nOK\r\n");

    let (result, lines) = collect(&iface, "AT+CIMI");
    result.unwrap();
    assert_eq!(lines, ["204080813324647"]);
    assert_eq!(modem.received(), ["AT+CIMI"]);
}

#[test]
fn bare_ok_succeeds_without_callback() {
    let (modem, iface) = started(|_| {});
    modem.respond("AT", "OK\r\n");

    let (result, lines) = collect(&iface, "AT");
    result.unwrap();
    assert!(lines.is_empty());
}

#[test]
fn lines_before_error_are_delivered_in_order() {
    let (modem, iface) = started(|_| {});
    modem.respond("AT+CGDCONT?", "first\r\nsecond\r\nthird\r\nERROR\r\n");

    let (result, lines) = collect(&iface, "AT+CGDCONT?");
    assert_eq!(lines, ["first", "second", "third"]);
    match result {
        Err(ModemError::CommandFailed { command, token }) => {
            assert_eq!(command, "AT+CGDCONT?");
            assert_eq!(token, "ERROR");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn error_transcript_is_logged_without_debug() {
    let (modem, iface) = started(|_| {});
    modem.respond("AT+FOO", "ERROR\r\n");

    let ((result, lines), logs) = with_captured_logs(|| collect(&iface, "AT+FOO"));
    assert!(matches!(result, Err(ModemError::CommandFailed { .. })));
    assert!(lines.is_empty());
    assert!(logs.contains("> AT+FOO"), "logs: {logs}");
    assert!(logs.contains("< ERROR"), "logs: {logs}");
    assert!(logs.contains("WARN"), "logs: {logs}");
}

#[test]
fn success_transcript_is_logged_only_in_debug() {
    let (modem, iface) = started(|_| {});
    modem.respond("AT", "OK\r\n");
    modem.respond("AT", "OK\r\n");

    let (result, quiet) = with_captured_logs(|| iface.transact("AT"));
    result.unwrap();
    assert!(!quiet.contains("> AT"), "logs: {quiet}");

    iface.set_debug(true);
    let (result, verbose) = with_captured_logs(|| iface.transact("AT"));
    result.unwrap();
    assert!(verbose.contains("> AT"), "logs: {verbose}");
    assert!(verbose.contains("< OK"), "logs: {verbose}");
}

#[test]
fn silence_times_out_after_line_timeout() {
    let (modem, iface) = started_with(
        ModemConfig::with_line_timeout(Duration::from_millis(100)),
        |_| {},
    );

    let begun = Instant::now();
    let (result, lines) = collect(&iface, "AT+SLOW");
    let elapsed = begun.elapsed();

    match result {
        Err(ModemError::Timeout(timeout)) => assert_eq!(timeout, Duration::from_millis(100)),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(lines.is_empty());
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < WAIT, "took {elapsed:?}");
    assert_eq!(modem.wait_for_commands(1, WAIT), ["AT+SLOW"]);
}

#[test]
fn late_reply_is_drained_by_next_transaction() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::clone(&seen);
    let (modem, iface) = started_with(
        ModemConfig::with_line_timeout(Duration::from_millis(100)),
        |iface| {
            iface
                .on_output(move |line| observed.lock().unwrap().push(line.to_string()))
                .unwrap();
        },
    );

    assert!(iface.transact("AT+SLOW").unwrap_err().is_timeout());
    modem.push("late\r\n").unwrap();
    std::thread::sleep(Duration::from_millis(100));

    modem.respond("AT", "OK\r\n");
    let (result, lines) = collect(&iface, "AT");
    result.unwrap();
    assert!(lines.is_empty());
    assert_eq!(*seen.lock().unwrap(), ["late"]);
}

#[test]
fn queued_urcs_never_reach_callback() {
    let (modem, iface) = started(|_| {});
    modem.push("+CEREG: 1\r\n+CSCON: 0\r\n").unwrap();
    std::thread::sleep(Duration::from_millis(100));

    modem.respond("AT+CGSN", "352656100367872\r\nOK\r\n");
    let (result, lines) = collect(&iface, "AT+CGSN");
    result.unwrap();
    assert_eq!(lines, ["352656100367872"]);
}

#[test]
fn added_success_token_ends_transaction() {
    let (modem, iface) = started(|iface| iface.add_success_token("SEND OK").unwrap());
    modem.respond("AT+QISEND=1,5", "SEND OK\r\n");

    let (result, lines) = collect(&iface, "AT+QISEND=1,5");
    result.unwrap();
    assert!(lines.is_empty());
}

#[test]
fn added_error_token_fails_transaction() {
    let (modem, iface) = started(|iface| iface.add_error_token("SEND FAIL").unwrap());
    modem.respond("AT+QISEND=1,5", "SEND FAIL\r\n");

    let (result, _) = collect(&iface, "AT+QISEND=1,5");
    match result {
        Err(ModemError::CommandFailed { token, .. }) => assert_eq!(token, "SEND FAIL"),
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn callback_failure_aborts_transaction() {
    let (modem, iface) = started(|_| {});
    modem.respond("AT+CGPADDR", "+CGPADDR: x\r\nmore\r\nOK\r\n");

    let mut calls = 0;
    let result = iface.transact_with("AT+CGPADDR", |line| {
        calls += 1;
        Err(ModemError::parse(format!("bad address line: {line}")))
    });

    assert_eq!(calls, 1);
    match result {
        Err(ModemError::Parse(message)) => assert!(message.contains("+CGPADDR: x")),
        other => panic!("expected Parse, got {other:?}"),
    }
}

#[test]
fn payload_follows_prompt_via_send_raw() {
    let (modem, iface) = started(|iface| {
        iface.add_delimiter(">").unwrap();
        iface.add_success_token("SEND OK").unwrap();
    });
    modem.respond("AT+QISEND=0,5", "\r\n> ");
    modem.respond("hello", "\r\nSEND OK\r\n");

    let mut prompted = false;
    iface
        .transact_with("AT+QISEND=0,5", |line| {
            if !prompted && line.trim().is_empty() {
                prompted = true;
                iface.send_raw("hello")?;
            }
            Ok(())
        })
        .unwrap();

    assert!(prompted);
    assert_eq!(modem.received(), ["AT+QISEND=0,5", "hello"]);
}

#[test]
fn prompt_line_is_told_apart_from_blank_line() {
    let (modem, iface) = started(|iface| {
        iface.add_delimiter(">").unwrap();
        iface.add_success_token("SEND OK").unwrap();
    });
    modem.respond("AT+QISEND=0,5", "\r\n> ");
    modem.respond("hello", "\r\nSEND OK\r\n");

    let mut endings = Vec::new();
    iface
        .transact_lines("AT+QISEND=0,5", |line| {
            endings.push(line.ended_by(">"));
            if line.ended_by(">") {
                iface.send_raw("hello")?;
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(endings, [false, true, false]);
    assert_eq!(modem.received(), ["AT+QISEND=0,5", "hello"]);
}

#[test]
fn response_longer_than_output_queue_arrives_whole() {
    let config = ModemConfig {
        output_capacity: 1,
        ..ModemConfig::with_line_timeout(WAIT)
    };
    let (modem, iface) = started_with(config, |_| {});
    let expected: Vec<String> = (1..=12)
        .map(|cid| format!("+CGDCONT: {cid},\"IP\",\"apn{cid}\""))
        .collect();
    let mut reply: String = expected.iter().map(|line| format!("{line}\r\n")).collect();
    reply.push_str("OK\r\n");
    modem.respond("AT+CGDCONT?", &reply);

    let (result, lines) = collect(&iface, "AT+CGDCONT?");
    result.unwrap();
    assert_eq!(lines, expected);
}

#[test]
fn classification_is_locked_after_start() {
    let (_modem, mut iface) = started(|_| {});

    assert!(matches!(iface.start(), Err(ModemError::AlreadyStarted)));
    assert!(matches!(
        iface.add_success_token("SEND OK"),
        Err(ModemError::AlreadyStarted)
    ));
    assert!(matches!(
        iface.add_error_token("SEND FAIL"),
        Err(ModemError::AlreadyStarted)
    ));
    assert!(matches!(iface.add_delimiter(">"), Err(ModemError::AlreadyStarted)));
    assert!(matches!(iface.on_output(|_| {}), Err(ModemError::AlreadyStarted)));
}

#[test]
fn concurrent_transactions_are_serialized() {
    let (modem, iface) = started(|_| {});
    modem.respond("AT+A", "a1\r\na2\r\nOK\r\n");
    modem.respond("AT+B", "b1\r\nb2\r\nOK\r\n");

    let (a, b) = std::thread::scope(|scope| {
        let a = scope.spawn(|| collect(&iface, "AT+A"));
        let b = scope.spawn(|| collect(&iface, "AT+B"));
        (a.join().unwrap(), b.join().unwrap())
    });

    a.0.unwrap();
    b.0.unwrap();
    assert_eq!(a.1, ["a1", "a2"]);
    assert_eq!(b.1, ["b1", "b2"]);
}

#[test]
fn hang_up_surfaces_link_failure() {
    let (modem, iface) = started(|_| {});
    modem.hang_up();
    std::thread::sleep(Duration::from_millis(100));

    match iface.transact("AT") {
        Err(ModemError::LinkFailed(reason)) => assert!(!reason.is_empty()),
        other => panic!("expected LinkFailed, got {other:?}"),
    }
    assert!(iface.link_failure().is_some());
    assert!(matches!(iface.send_raw("AT"), Err(ModemError::LinkFailed(_))));
}

#[test]
fn close_is_idempotent_and_stops_transactions() {
    let (_modem, mut iface) = started(|_| {});
    iface.close();
    iface.close();

    assert!(!iface.is_started());
    assert!(matches!(iface.transact("AT"), Err(ModemError::NotStarted)));
}
