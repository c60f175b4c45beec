mod common;

use trx_core::debug;
use trx_entities::trx::TrxId;
use common::{ComponentTest, default_test_config};

#[test]
fn test_unknown_and_malformed_commands() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config());

    let rsp = test.ctrl(0, "ECHO hello");
    assert_eq!(rsp.to_string(), "RSP ECHO 0 hello");

    assert_eq!(test.ctrl(0, "RXTUNE abc").status, -1);
    assert_eq!(test.ctrl(0, "RXTUNE").status, -1);
    assert_eq!(test.ctrl(0, "POWERON now").status, -1);

    // Not a command: no response
    let ctx = trx_entities::ctrl::CtrlContext {
        trx_list: test.trx_list.as_ref(),
        clck_gen: None,
        pwr_meas: None,
    };
    let rsp = trx_entities::ctrl::handle_request(&ctx, test.trx(0), b"RSP POWERON 0\0").unwrap();
    assert!(rsp.is_none());
}

#[test]
fn test_poweron_preconditions_and_clock() {
    let test = ComponentTest::new(default_test_config());

    // Not tuned yet
    assert_eq!(test.ctrl(0, "POWERON").status, -1);
    assert_eq!(test.ctrl(0, "RXTUNE 880000").status, 0);
    assert_eq!(test.ctrl(0, "POWERON").status, -1);
    assert_eq!(test.ctrl(0, "TXTUNE 925000").status, 0);

    let rsp = test.ctrl(0, "POWERON");
    assert_eq!(rsp.to_string(), "RSP POWERON 0");
    assert!(test.trx(0).is_running());
    assert!(test.clck_gen.is_running());
    assert!(test.clck_gen.has_link(0));

    // Already running
    assert_eq!(test.ctrl(0, "POWERON").status, -1);

    // Second clock subscriber keeps the clock alive
    test.power_on(1, 925_000, 880_000, &[]);
    assert_eq!(test.clck_gen.num_links(), 2);
    assert_eq!(test.ctrl(0, "POWEROFF").status, 0);
    assert!(!test.trx(0).is_running());
    assert!(test.clck_gen.is_running());
    assert_eq!(test.ctrl(1, "POWEROFF").status, 0);
    assert!(!test.clck_gen.is_running());
    assert_eq!(test.clck_gen.num_links(), 0);

    // Tuning survives a power cycle
    assert_eq!(test.ctrl(0, "POWERON").status, 0);
}

#[test]
fn test_clock_indications() {
    let mut config = default_test_config();
    config.clock.ind_period = 4;
    let test = ComponentTest::new(config);
    test.power_on_pair(&[]);

    test.tick_until(12);
    assert_eq!(test.take_clck(0), vec![4, 8, 12]);
    assert_eq!(test.take_clck(1), vec![4, 8, 12]);

    assert_eq!(test.ctrl(1, "POWEROFF").status, 0);
    test.tick_until(16);
    assert_eq!(test.take_clck(0), vec![16]);
    assert!(test.take_clck(1).is_empty());
}

#[test]
fn test_child_power_propagation() {
    let mut config = default_test_config();
    config.add_trx_def(&"127.0.0.1:5700/1".parse().unwrap()).unwrap();
    let test = ComponentTest::new(config);
    assert_eq!(test.trx(0).children(), &[TrxId(2)]);

    test.power_on(0, 880_000, 925_000, &[]);
    assert!(test.trx(2).is_running());
    // Children share the parent's clock
    assert_eq!(test.clck_gen.num_links(), 1);

    assert_eq!(test.ctrl(2, "SETFH 0 0 880200 925200").status, 0);
    assert_eq!(test.ctrl(0, "POWEROFF").status, 0);
    assert!(!test.trx(2).is_running());
    assert!(test.trx(2).state().fh.is_none());

    // A child on its own does not power its parent
    assert_eq!(test.ctrl(2, "RXTUNE 880200").status, 0);
    assert_eq!(test.ctrl(2, "TXTUNE 925200").status, 0);
    assert_eq!(test.ctrl(2, "POWERON").status, 0);
    assert!(!test.trx(0).is_running());
    assert!(!test.clck_gen.is_running());
}

#[test]
fn test_child_management_disabled() {
    let mut config = default_test_config();
    config.add_trx_def(&"127.0.0.1:5700/1".parse().unwrap()).unwrap();
    config.trx[0].child_mgt = false;
    let test = ComponentTest::new(config);

    test.power_on(0, 880_000, 925_000, &[]);
    assert!(!test.trx(2).is_running());
}

#[test]
fn test_setformat_negotiation() {
    let test = ComponentTest::new(default_test_config());

    assert_eq!(test.ctrl(0, "SETFORMAT 1").status, 1);
    assert_eq!(test.trx(0).state().hdr_ver, 1);

    // Unsupported version: the best lower one is suggested, nothing changes
    let rsp = test.ctrl(0, "SETFORMAT 5");
    assert_eq!(rsp.to_string(), "RSP SETFORMAT 2 5");
    assert_eq!(test.trx(0).state().hdr_ver, 1);

    assert_eq!(test.ctrl(0, "SETFORMAT 2").status, 2);
    assert_eq!(test.trx(0).state().hdr_ver, 2);

    assert_eq!(test.ctrl(0, "SETFORMAT 16").status, -1);
    assert_eq!(test.ctrl(0, "SETFORMAT -1").status, -1);
    assert_eq!(test.trx(0).state().hdr_ver, 2);
}

#[test]
fn test_setslot() {
    let test = ComponentTest::new(default_test_config());
    assert_eq!(test.ctrl(0, "SETSLOT 8 1").status, -1);
    assert_eq!(test.ctrl(0, "SETSLOT 3").status, -1);

    assert_eq!(test.ctrl(0, "SETSLOT 3 1").status, 0);
    assert!(test.trx(0).state().has_slot(3));
    assert_eq!(test.ctrl(0, "SETSLOT 3 0").status, 0);
    assert!(!test.trx(0).state().has_slot(3));
}

#[test]
fn test_power_commands() {
    let test = ComponentTest::new(default_test_config());
    assert_eq!(test.ctrl(0, "NOMTXPOWER").to_string(), "RSP NOMTXPOWER 0 50");
    assert_eq!(test.ctrl(0, "SETPOWER 12").status, 0);
    assert_eq!(test.trx(0).state().tx_att_base, 12);
    assert_eq!(test.ctrl(0, "RFMUTE 1").status, 0);
    assert!(test.trx(0).state().rf_muted);
}

#[test]
fn test_measure() {
    let test = ComponentTest::new(default_test_config());
    let cfg = test.config.config();

    let rsp = test.ctrl(1, "MEASURE 925000");
    assert_eq!(rsp.status, 0);
    assert_eq!(rsp.args[0], "925000");
    let dbm: i16 = rsp.args[1].parse().unwrap();
    assert!((cfg.pwr_meas.noise_min..=cfg.pwr_meas.noise_max).contains(&dbm));

    // BTS transmitting on the measured frequency
    test.power_on(0, 880_000, 925_000, &[]);
    let dbm: i16 = test.ctrl(1, "MEASURE 925000").args[1].parse().unwrap();
    assert!((cfg.pwr_meas.trx_min..=cfg.pwr_meas.trx_max).contains(&dbm));
}

#[test]
fn test_setta() {
    let test = ComponentTest::new(default_test_config());
    assert_eq!(test.ctrl(0, "SETTA 64").status, -1);
    assert_eq!(test.ctrl(0, "SETTA -1").status, -1);
    assert_eq!(test.ctrl(0, "SETTA 3").status, 0);
    assert_eq!(test.trx(0).state().sim.ta, 3);

    // Bursts from a transceiver with TA set arrive early
    test.power_on_pair(&[0]);
    test.send_tx(0, &[trx_pdus::TxMsg::new(0, 1, 0, Some(common::gmsk_burst()))]);
    test.tick();
    assert_eq!(test.take_rx(1)[0].toa256, -768);
}

#[test]
fn test_fake_params() {
    let test = ComponentTest::new(default_test_config());

    assert_eq!(test.ctrl(1, "FAKE_RSSI -70 5").status, 0);
    {
        let state = test.trx(1).state();
        assert!(state.sim.fake_rssi);
        assert_eq!(state.sim.rssi_base, -70);
        assert_eq!(state.sim.rssi_threshold, 5);
    }
    assert_eq!(test.ctrl(1, "FAKE_RSSI 3").status, 0);
    assert_eq!(test.trx(1).state().sim.rssi_base, -67);

    assert_eq!(test.ctrl(1, "FAKE_TOA 128 0").status, 0);
    assert_eq!(test.ctrl(1, "FAKE_TOA -28").status, 0);
    assert_eq!(test.trx(1).state().sim.toa256_base, 100);

    assert_eq!(test.ctrl(1, "FAKE_CI 60 10").status, 0);
    assert_eq!(test.trx(1).state().sim.ci_threshold, 10);

    assert_eq!(test.ctrl(1, "FAKE_TOA 1 2 3").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_CI").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_RSSI x").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_RSSI -70 -1").status, -1);
}

#[test]
fn test_fake_rssi_applied_to_bursts() {
    let test = ComponentTest::new(default_test_config());
    test.power_on_pair(&[0]);
    assert_eq!(test.ctrl(1, "FAKE_RSSI -80 0").status, 0);

    test.send_tx(0, &[trx_pdus::TxMsg::new(0, 1, 0, Some(common::gmsk_burst()))]);
    test.tick();
    assert_eq!(test.take_rx(1)[0].rssi, -80);
}

#[test]
fn test_out_of_range_params_rejected() {
    let test = ComponentTest::new(default_test_config());
    test.power_on_pair(&[0]);

    assert_eq!(test.ctrl(0, "SETPOWER -2147483648").status, -1);
    assert_eq!(test.ctrl(0, "SETPOWER 256").status, -1);
    assert_eq!(test.ctrl(0, "SETPOWER 255").status, 0);
    assert_eq!(test.trx(0).state().tx_att_base, 255);

    assert_eq!(test.ctrl(1, "FAKE_TOA 2000000000 2000000000").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_CI 0 40000").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_RSSI -32769 0").status, -1);
    assert!(!test.trx(1).state().sim.fake_rssi);

    // Relative shifts stop at the edge of the 16-bit range
    assert_eq!(test.ctrl(1, "FAKE_RSSI 30000 0").status, 0);
    assert_eq!(test.ctrl(1, "FAKE_RSSI 2767").status, 0);
    assert_eq!(test.ctrl(1, "FAKE_RSSI 1").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_TOA -9223372036854775807").status, -1);
    {
        let state = test.trx(1).state();
        assert_eq!(state.sim.rssi_base, i16::MAX as i32);
        assert_eq!(state.sim.toa256_base, 0);
    }

    // The clock keeps running and bursts keep flowing
    test.send_tx(0, &[trx_pdus::TxMsg::new(0, 1, 0, Some(common::gmsk_burst()))]);
    test.tick();
    let rx = test.take_rx(1);
    assert_eq!(rx.len(), 1);
    assert_eq!(rx[0].rssi, trx_pdus::trxd::msgs::RSSI_MAX);
}

#[test]
fn test_fake_drop_args() {
    let test = ComponentTest::new(default_test_config());
    assert_eq!(test.ctrl(1, "FAKE_DROP 2").status, 0);
    {
        let state = test.trx(1).state();
        assert_eq!(state.sim.drop_amount, 2);
        assert_eq!(state.sim.drop_period, 1);
    }
    assert_eq!(test.ctrl(1, "FAKE_DROP -1").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_DROP 1 0").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_DROP 1 -4").status, -1);
    assert_eq!(test.ctrl(1, "FAKE_DROP").status, -1);
}

#[test]
fn test_setfh() {
    let test = ComponentTest::new(default_test_config());

    assert_eq!(test.ctrl(0, "SETFH 5 3 9000 9002000 9100 9102000").status, 0);
    {
        let state = test.trx(0).state();
        let fh = state.fh.as_ref().unwrap();
        assert_eq!(fh.hsn(), 5);
        assert_eq!(fh.maio(), 3);
        assert_eq!(fh.ma(), &[(9_000_000, 9_002_000_000), (9_100_000, 9_102_000_000)]);
        // Hopping makes the transceiver ready without fixed tuning
        assert!(state.ready());
    }

    assert_eq!(test.ctrl(0, "SETFH 5 3 9000").status, -1);
    assert_eq!(test.ctrl(0, "SETFH 5 3 9000 9002000 9100").status, -1);
    assert_eq!(test.ctrl(0, "SETFH 64 0 9000 9002000").status, -1);
    assert_eq!(test.ctrl(0, "SETFH 5 x 9000 9002000").status, -1);
}
