use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use hl7tools::extract::BatchSplitter;
use hl7tools::{DelimiterSet, Session};
use mllp::{ListenerConfig, ListenerEvent, MllpListener, MllpSender, SenderConfig};
use tokio::time::timeout;

const BATCH: &str = "FHS|^~\\&|LAB\n\
MSH|^~\\&|LAB|H|EMR|H|20240101||ORU^R01|A1|P|2.5\n\
PID|1||111||Doe^John\n\
MSH|^~\\&|LAB|H|EMR|H|20240101||ORU^R01|A2|P|2.5\n\
PID|1||222||Roe^Ann\n";

async fn start_listener() -> (mllp::ListenerHandle, tokio::sync::mpsc::Receiver<ListenerEvent>) {
    let config = ListenerConfig {
        bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        ..Default::default()
    };
    let listener = MllpListener::bind(config).await.expect("bind listener");
    listener.start().expect("start listener")
}

#[tokio::test]
async fn split_batch_is_sent_and_received_message_by_message() {
    let (handle, mut events) = start_listener().await;
    let port = handle.local_addr().port();
    let sender = MllpSender::new(SenderConfig::new("127.0.0.1", port).with_timeout(5_000));

    let split = BatchSplitter::default().split(BATCH, &DelimiterSet::from_text(BATCH));
    assert_eq!(split.count(), 2);

    for (message, control_id) in split.messages.iter().zip(["A1", "A2"]) {
        let report = sender.send(message).await.expect("send");
        let ack = report.ack.expect("acknowledged");
        assert!(ack.contains(&format!("MSA|AA|{}", control_id)), "{}", ack);

        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event in time")
            .expect("listener running");
        let ListenerEvent::Received { message, .. } = event else {
            panic!("unexpected event");
        };

        let text = String::from_utf8(message.to_vec()).expect("utf-8 payload");
        assert!(!text.contains('\n'));
        let session = Session::new(text);
        let id = session.locate_all("MSH-10");
        assert_eq!(id[0].span.text(session.text()), control_id);
        assert!(session.missing_required_fields().is_empty());
    }

    handle.stop().await;
    assert!(handle.is_stopped());
}

#[tokio::test]
async fn stop_is_idempotent() {
    let (handle, _events) = start_listener().await;
    handle.stop().await;
    handle.stop().await;
    assert!(handle.is_stopped());
}
