#![allow(clippy::unwrap_used, clippy::expect_used)]

use duelrtc::log::NoopLogSink;
use duelrtc::message::{Envelope, Payload, PlayerState};
use duelrtc::negotiation::{NegotiationError, NegotiationState, Role};
use duelrtc::session::{Session, SessionConfig, SessionError};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

const CONNECT_LIMIT: Duration = Duration::from_secs(15);

struct Peer {
    session: Session,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Envelope>>>,
    offer: Arc<Mutex<Option<String>>>,
}

impl Peer {
    fn new() -> Self {
        Self::with_config(SessionConfig::loopback())
    }

    fn with_config(config: SessionConfig) -> Self {
        let mut session = Session::new(config, Arc::new(NoopLogSink));
        let opens = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let offer = Arc::new(Mutex::new(None));

        let o = Arc::clone(&opens);
        session
            .on_open()
            .subscribe(move |_| {
                o.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let c = Arc::clone(&closes);
        session
            .on_close()
            .subscribe(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let r = Arc::clone(&received);
        session
            .on_message()
            .subscribe(move |env: &Envelope| r.lock().unwrap().push(env.clone()))
            .unwrap();
        let slot = Arc::clone(&offer);
        session
            .on_offer_ready()
            .subscribe(move |text: &String| *slot.lock().unwrap() = Some(text.clone()))
            .unwrap();

        Self {
            session,
            opens,
            closes,
            received,
            offer,
        }
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn received(&self) -> Vec<Envelope> {
        self.received.lock().unwrap().clone()
    }
}

/// Polls both peers until `done` holds or `limit` passes.
fn pump(a: &mut Peer, b: &mut Peer, limit: Duration, mut done: impl FnMut(&Peer, &Peer) -> bool) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        a.session.poll();
        b.session.poll();
        if done(a, b) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

fn wait_for_offer(host: &mut Peer) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        host.session.poll();
        if let Some(offer) = host.offer.lock().unwrap().clone() {
            return offer;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("host never produced an offer");
}

/// Runs the whole exchange up to the point where both descriptions are set.
fn negotiate() -> (Peer, Peer) {
    let mut host = Peer::new();
    let mut guest = Peer::new();

    let room = host.session.create_room().unwrap();
    assert!(!room.as_str().is_empty() && room.as_str().len() <= 8);
    let offer = wait_for_offer(&mut host);
    assert!(!offer.is_empty());

    // the room id is relayed by hand, possibly in lowercase
    let answer = guest
        .session
        .join_room(&room.as_str().to_lowercase(), &offer)
        .unwrap();
    assert!(!answer.is_empty());
    assert_eq!(guest.session.room_id(), room.as_str());

    host.session.finalize(&answer).unwrap();
    (host, guest)
}

fn connect() -> (Peer, Peer) {
    let (mut host, mut guest) = negotiate();
    assert!(
        pump(&mut host, &mut guest, CONNECT_LIMIT, |h, g| {
            h.session.is_connected() && g.session.is_connected()
        }),
        "peers did not connect: host {:?}, guest {:?}",
        host.session.state(),
        guest.session.state()
    );
    (host, guest)
}

fn state_update(health: i32, score: u32) -> Payload {
    Payload::StateUpdate(PlayerState {
        health,
        score,
        ..PlayerState::default()
    })
}

#[test]
fn guest_state_update_reaches_host() {
    let (mut host, mut guest) = connect();
    assert_eq!(host.opens(), 1);
    assert_eq!(guest.opens(), 1);
    assert!(host.session.is_host());
    assert_eq!(guest.session.role(), Some(Role::Guest));
    assert_eq!(
        host.session.state(),
        NegotiationState::Connected { role: Role::Host }
    );

    guest.session.send(state_update(80, 0));
    assert!(pump(&mut host, &mut guest, Duration::from_secs(5), |h, _| {
        !h.received().is_empty()
    }));

    let got = host.received();
    assert_eq!(got.len(), 1);
    let Payload::StateUpdate(state) = got[0].payload() else {
        panic!("expected a state update, got {:?}", got[0]);
    };
    assert_eq!(state.health, 80);

    // a little more traffic does not re-fire on_open
    pump(&mut host, &mut guest, Duration::from_millis(200), |_, _| false);
    assert_eq!(host.opens(), 1);
    assert_eq!(guest.opens(), 1);
}

#[test]
fn sends_before_connected_are_never_delivered() {
    let (mut host, mut guest) = negotiate();
    guest.session.send(state_update(1, 1));
    host.session.send(state_update(2, 2));

    assert!(pump(&mut host, &mut guest, CONNECT_LIMIT, |h, g| {
        h.session.is_connected() && g.session.is_connected()
    }));
    pump(&mut host, &mut guest, Duration::from_millis(300), |_, _| false);
    assert!(host.received().is_empty());
    assert!(guest.received().is_empty());
}

#[test]
fn many_messages_arrive_in_order_and_intact() {
    let (mut host, mut guest) = connect();
    const N: u32 = 50;
    for i in 0..N {
        host.session.send(state_update(100, i));
    }

    assert!(pump(&mut host, &mut guest, Duration::from_secs(5), |_, g| {
        g.received().len() >= usize::try_from(N).unwrap()
    }));
    let got = guest.received();
    assert_eq!(got.len(), usize::try_from(N).unwrap());
    for (i, env) in got.iter().enumerate() {
        let Payload::StateUpdate(state) = env.payload() else {
            panic!("unexpected payload {env:?}");
        };
        assert_eq!(state.score, u32::try_from(i).unwrap());
        assert_eq!(state.health, 100);
    }
    assert!(got.windows(2).all(|w| w[0].sent_at() <= w[1].sent_at()));
}

#[test]
fn closing_one_side_closes_the_other_once() {
    let (mut host, mut guest) = connect();

    guest.session.close();
    assert_eq!(guest.closes(), 1);
    assert_eq!(guest.session.state(), NegotiationState::Failed);

    assert!(
        pump(&mut host, &mut guest, Duration::from_secs(10), |h, _| h.closes() > 0),
        "host never noticed the close"
    );
    pump(&mut host, &mut guest, Duration::from_millis(300), |_, _| false);
    assert_eq!(host.closes(), 1);
    assert_eq!(guest.closes(), 1);
    assert_eq!(host.session.state(), NegotiationState::Failed);
    assert!(!host.session.is_connected());

    // terminal: no sends, no new negotiation
    host.session.send(state_update(1, 1));
    assert!(matches!(
        host.session.create_room(),
        Err(SessionError::Negotiation(NegotiationError::Terminal))
    ));
}

#[test]
fn second_offer_is_rejected_once_negotiating() {
    let (mut host, mut guest) = connect();
    let offer = host.session.local_description().unwrap().to_owned();
    let before = guest.session.state();
    assert!(guest.session.join_room("ROOM", &offer).is_err());
    assert_eq!(guest.session.state(), before);
    assert!(pump(&mut host, &mut guest, Duration::from_millis(200), |h, g| {
        h.session.is_connected() && g.session.is_connected()
    }));
}

#[test]
fn answer_for_another_offer_is_rejected() {
    let mut host_a = Peer::new();
    let mut host_b = Peer::new();
    host_a.session.create_room().unwrap();
    host_b.session.create_room().unwrap();
    let _ = wait_for_offer(&mut host_a);
    let offer_b = wait_for_offer(&mut host_b);

    let mut guest = Peer::new();
    let answer_for_b = guest.session.join_room("ROOM", &offer_b).unwrap();

    assert!(matches!(
        host_a.session.finalize(&answer_for_b),
        Err(SessionError::Negotiation(NegotiationError::ForeignAnswer))
    ));
    assert_eq!(
        host_a.session.state(),
        NegotiationState::AwaitingRemoteDescription
    );

    // the right host still accepts it
    host_b.session.finalize(&answer_for_b).unwrap();
    assert!(pump(&mut host_b, &mut guest, CONNECT_LIMIT, |h, g| {
        h.session.is_connected() && g.session.is_connected()
    }));
}

#[test]
fn slow_answer_relay_still_connects() {
    let mut config = SessionConfig::loopback();
    config.ice.connect_timeout = Duration::from_secs(1);
    let mut host = Peer::with_config(config.clone());
    let mut guest = Peer::with_config(config);

    let room = host.session.create_room().unwrap();
    let offer = wait_for_offer(&mut host);
    let answer = guest.session.join_room(room.as_str(), &offer).unwrap();

    // the answer takes longer than connect_timeout to reach the host
    pump(&mut host, &mut guest, Duration::from_millis(1500), |_, _| false);
    assert_eq!(
        guest.session.state(),
        NegotiationState::Checking { role: Role::Guest }
    );
    assert_eq!(guest.closes(), 0);

    host.session.finalize(&answer).unwrap();
    assert!(
        pump(&mut host, &mut guest, CONNECT_LIMIT, |h, g| {
            h.session.is_connected() && g.session.is_connected()
        }),
        "peers did not connect: host {:?}, guest {:?}",
        host.session.state(),
        guest.session.state()
    );
}
