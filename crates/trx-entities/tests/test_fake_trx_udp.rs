use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use trx_config::{REMOTE_PORT_OFFSET, SharedConfig, StackConfig};
use trx_core::gsm_time::fn_add;
use trx_core::modulation::GMSK_BURST_LEN;
use trx_entities::{Event, FakeTrx};
use trx_pdus::{ClockInd, CtrlRsp, RxMsg, TxMsg};

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const BTS_BASE_PORT: u16 = 25700;
const BB_BASE_PORT: u16 = 26700;

/// The L1 side of one transceiver: clock, control and data sockets
struct FakeL1 {
    base_port: u16,
    clck: UdpSocket,
    ctrl: UdpSocket,
    data: UdpSocket,
}

impl FakeL1 {
    fn bind(base_port: u16) -> Self {
        let sock = |offset: u16| {
            let s = UdpSocket::bind(SocketAddr::new(LOCALHOST, base_port + REMOTE_PORT_OFFSET + offset)).unwrap();
            s.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
            s
        };
        Self {
            base_port,
            clck: sock(0),
            ctrl: sock(1),
            data: sock(2),
        }
    }

    fn cmd(&self, cmd: &str) -> CtrlRsp {
        let req = format!("CMD {}\0", cmd);
        self.ctrl.send_to(req.as_bytes(), SocketAddr::new(LOCALHOST, self.base_port + 1)).unwrap();
        let mut buf = [0u8; 256];
        let len = self.ctrl.recv(&mut buf).unwrap();
        CtrlRsp::from_bytes(&buf[..len]).unwrap()
    }

    fn send_burst(&self, msg: &TxMsg) {
        let pdu = msg.to_bytes().unwrap();
        self.data.send_to(&pdu, SocketAddr::new(LOCALHOST, self.base_port + 2)).unwrap();
    }

    fn recv_clock(&self) -> u32 {
        let mut buf = [0u8; 64];
        let len = self.clck.recv(&mut buf).unwrap();
        ClockInd::from_bytes(&buf[..len]).unwrap().fn_num
    }

    fn recv_burst(&self) -> RxMsg {
        let mut buf = [0u8; 512];
        let len = self.data.recv(&mut buf).unwrap();
        RxMsg::from_bytes(&buf[..len]).unwrap()
    }
}

#[test]
fn test_bts_to_ms_over_udp() {
    let cfg = StackConfig::with_bts_and_bb(LOCALHOST, (LOCALHOST, BTS_BASE_PORT), (LOCALHOST, BB_BASE_PORT));
    let mut app = FakeTrx::new(SharedConfig::from_config(cfg).unwrap()).unwrap();
    let events = app.event_sender();
    let runner = thread::spawn(move || app.run());

    let bts = FakeL1::bind(BTS_BASE_PORT);
    let ms = FakeL1::bind(BB_BASE_PORT);

    for (l1, rx, tx) in [(&bts, 880_000, 925_000), (&ms, 925_000, 880_000)] {
        assert_eq!(l1.cmd(&format!("RXTUNE {}", rx)).status, 0);
        assert_eq!(l1.cmd(&format!("TXTUNE {}", tx)).status, 0);
        assert_eq!(l1.cmd("SETSLOT 0 1").status, 0);
        assert_eq!(l1.cmd("POWERON").to_string(), "RSP POWERON 0");
    }

    // Schedule a burst a bit ahead of the clock
    let now = bts.recv_clock();
    let fn_num = fn_add(now, 20);
    let burst: Vec<u8> = (0..GMSK_BURST_LEN).map(|i| (i % 2) as u8).collect();
    bts.send_burst(&TxMsg::new(0, fn_num, 0, Some(burst)));

    let rx = ms.recv_burst();
    assert_eq!(rx.fn_num, fn_num);
    assert_eq!(rx.tn, 0);
    assert_eq!(rx.rssi, -60);

    assert_eq!(bts.cmd("POWEROFF").status, 0);
    assert_eq!(ms.cmd("POWEROFF").status, 0);

    events.send(Event::Shutdown).unwrap();
    runner.join().unwrap().unwrap();
}
