//! End-to-end tests across normalization, cumulation, netting and IRR.

mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use common::*;
use portfolio_ledger::domain::cash_flow::{cash_flows_from_trades, npv, CashFlow};
use portfolio_ledger::domain::cumulation::cumulate;
use portfolio_ledger::domain::error::LedgerError;
use portfolio_ledger::domain::irr::{irr, IrrConfig, IrrOutcome};
use portfolio_ledger::domain::netting::build_portfolio;
use portfolio_ledger::domain::reference::ReferenceTable;
use portfolio_ledger::domain::trade::OptionType;
use portfolio_ledger::ports::reference_port::ReferencePort;
use portfolio_ledger::ports::trade_port::TradePort;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn sample_ledger() -> MockTradePort {
    MockTradePort::new()
        .with_trade(make_trade("FOLD1", Position::Long, 100.0, 10.0, "2024-03-01 - 09:00"))
        .with_trade(make_trade("FOLD1", Position::Long, 130.0, 30.0, "2024-03-02"))
        .with_trade(make_trade("FOLD1", Position::Short, 150.0, 15.0, "2024-03-10"))
        .with_trade(make_trade("ضخود1", Position::Long, 50.0, 10.0, "2024-03-05"))
        .with_trade(make_trade("ضخود1", Position::Short, 70.0, 10.0, "2024-03-20"))
        .with_trade(make_trade("طخود1", Position::Short, 20.0, 8.0, "2024-03-30"))
}

fn sample_reference() -> MockReferencePort {
    MockReferencePort::new().with_market("FOLD1", Market::Equity)
}

mod pipeline {
    use super::*;

    #[test]
    fn normalizes_whole_ledger() {
        let records = normalize(&sample_ledger(), &sample_reference()).unwrap();

        assert_eq!(records.len(), 6);
        assert_eq!(records[0].date, date(2024, 3, 1));
        assert_eq!(records[0].holding_days, 30);
        assert_eq!(records[0].market, Market::Equity);
        assert_eq!(records[3].market, Market::Option);
        assert!(records[3].market_defaulted);
        assert_eq!(records[3].option_type, Some(OptionType::Call));
        assert_eq!(records[5].option_type, Some(OptionType::Put));
        assert_eq!(records[5].holding_days, 1);
    }

    #[test]
    fn cumulates_held_positions() {
        let records = normalize(&sample_ledger(), &sample_reference()).unwrap();
        let positions = cumulate(&records).unwrap();

        assert_eq!(positions.len(), 5);
        let fold_long = positions
            .iter()
            .find(|p| p.symbol == "FOLD1" && p.position == Position::Long)
            .unwrap();
        assert_abs_diff_eq!(fold_long.price, 122.5, epsilon = 1e-9);
        assert_abs_diff_eq!(fold_long.volume, 40.0, epsilon = 1e-9);
        assert_eq!(fold_long.holding_days, 30);
    }

    #[test]
    fn nets_current_holdings() {
        let ledger = sample_ledger();
        let table = ReferenceTable::new(sample_reference().fetch_reference().unwrap());
        let entries = build_portfolio(
            &ledger.fetch_trades().unwrap(),
            &table,
            &OptionPrefixes::default(),
        )
        .unwrap();

        // ضخود1 is fully closed.
        let symbols: Vec<_> = entries.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["FOLD1", "طخود1"]);

        assert_eq!(entries[0].position, Position::Long);
        assert_abs_diff_eq!(entries[0].volume, 25.0, epsilon = 1e-12);
        assert_eq!(entries[0].market, Market::Equity);

        assert_eq!(entries[1].position, Position::Short);
        assert_abs_diff_eq!(entries[1].volume, 8.0, epsilon = 1e-12);
        assert_eq!(entries[1].option_type, Some(OptionType::Put));
    }

    #[test]
    fn five_five_three_nets_to_seven_long() {
        let trades = vec![
            make_trade("FOLD1", Position::Long, 10.0, 5.0, "2024-03-01"),
            make_trade("FOLD1", Position::Long, 11.0, 5.0, "2024-03-02"),
            make_trade("FOLD1", Position::Short, 12.0, 3.0, "2024-03-03"),
        ];
        let entries =
            build_portfolio(&trades, &ReferenceTable::default(), &OptionPrefixes::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position, Position::Long);
        assert_abs_diff_eq!(entries[0].volume, 7.0, epsilon = 1e-12);
    }

    #[test]
    fn irr_of_ledger_with_terminal_value() {
        let trades = MockTradePort::new()
            .with_trade(make_trade("FOLD1", Position::Long, 100.0, 10.0, "2024-03-01"));
        let records = normalize(&trades, &sample_reference()).unwrap();
        let flows = cash_flows_from_trades(&records, Some(1100.0));

        assert_eq!(flows, vec![CashFlow::new(-1000.0, 30.0), CashFlow::new(1100.0, 0.0)]);
        let rate = irr(&flows, &IrrConfig::default()).unwrap().rate().unwrap();
        assert_abs_diff_eq!(rate, 0.10, epsilon = 1e-6);
    }

    #[test]
    fn irr_without_terminal_value_on_buys_only() {
        let records = normalize(
            &MockTradePort::new().with_trade(make_trade("FOLD1", Position::Long, 100.0, 1.0, "2024-03-01")),
            &sample_reference(),
        )
        .unwrap();
        let flows = cash_flows_from_trades(&records, None);
        assert_eq!(irr(&flows, &IrrConfig::default()).unwrap(), IrrOutcome::NotBracketed);
    }

    #[test]
    fn source_errors_propagate() {
        let err = normalize(&MockTradePort::new().with_error("sheet locked"), &sample_reference())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Source { ref reason } if reason == "sheet locked"));
    }

    #[test]
    fn bad_row_is_identified() {
        let trades = MockTradePort::new()
            .with_trade(make_trade("FOLD1", Position::Long, 100.0, 1.0, "2024-03-01"))
            .with_trade(make_trade("FOLD1", Position::Long, 100.0, 1.0, "2024-02-30"));
        let err = normalize(&trades, &sample_reference()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidField { row: 2, ref field, .. } if field == "date"));
    }
}

mod irr_properties {
    use super::*;

    #[test]
    fn monthly_ten_percent() {
        let flows = [CashFlow::new(-1000.0, 30.0), CashFlow::new(1100.0, 0.0)];
        let outcome = irr(&flows, &IrrConfig::default()).unwrap();
        assert_abs_diff_eq!(outcome.rate().unwrap(), 0.10, epsilon = 1e-6);
    }

    #[test]
    fn all_positive_is_not_found() {
        let flows = [CashFlow::new(100.0, 0.0), CashFlow::new(100.0, 30.0)];
        assert_eq!(irr(&flows, &IrrConfig::default()).unwrap(), IrrOutcome::NotBracketed);
    }

    #[test]
    fn narrower_cap_gives_up_sooner() {
        // r = 19 needs the bracket to reach 20.
        let flows = [CashFlow::new(-1000.0, 30.0), CashFlow::new(20000.0, 0.0)];
        let config = IrrConfig {
            max_upper: 15.0,
            ..IrrConfig::default()
        };
        assert_eq!(irr(&flows, &config).unwrap(), IrrOutcome::NotBracketed);
    }

    #[test]
    fn irregular_spacing_zeroes_npv() {
        let flows = [
            CashFlow::new(-5000.0, 97.0),
            CashFlow::new(-1200.0, 41.0),
            CashFlow::new(800.0, 13.0),
            CashFlow::new(6100.0, 0.0),
        ];
        let rate = irr(&flows, &IrrConfig::default()).unwrap().rate().unwrap();
        assert!(rate > 0.0 && rate < 1.0);
        assert_abs_diff_eq!(npv(&flows, rate), 0.0, epsilon = 0.05);
    }
}

fn trade_strategy() -> impl Strategy<Value = TradeRecord> {
    (0usize..4, any::<bool>(), 1.0f64..1000.0, 1.0f64..500.0).prop_map(
        |(sym, long, price, volume)| TradeRecord {
            date: date(2024, 3, 1),
            fund: "alpha".into(),
            symbol: format!("SYM{sym}"),
            position: if long { Position::Long } else { Position::Short },
            price,
            volume,
            market: Market::Equity,
            market_defaulted: false,
            option_type: None,
            holding_days: 30,
        },
    )
}

proptest! {
    #[test]
    fn cumulation_is_volume_weighted(trades in prop::collection::vec(trade_strategy(), 1..40)) {
        let positions = cumulate(&trades).unwrap();

        let keys: HashSet<_> = trades.iter().map(|t| (t.symbol.clone(), t.position)).collect();
        prop_assert_eq!(positions.len(), keys.len());

        for p in &positions {
            let members: Vec<_> = trades
                .iter()
                .filter(|t| t.symbol == p.symbol && t.position == p.position)
                .collect();
            let volume: f64 = members.iter().map(|t| t.volume).sum();
            let weighted: f64 = members.iter().map(|t| t.price * t.volume).sum();
            assert_relative_eq!(p.volume, volume, max_relative = 1e-9);
            assert_relative_eq!(p.price, weighted / volume, max_relative = 1e-9);
        }
    }

    #[test]
    fn netting_matches_signed_sum(trades in prop::collection::vec(trade_strategy(), 1..40)) {
        let raw: Vec<RawTrade> = trades
            .iter()
            .map(|t| make_trade(&t.symbol, t.position, t.price, t.volume.round(), "2024-03-01"))
            .collect();
        let entries =
            build_portfolio(&raw, &ReferenceTable::default(), &OptionPrefixes::default()).unwrap();

        let mut expected: HashMap<&str, f64> = HashMap::new();
        for t in &raw {
            *expected.entry(t.symbol.as_str()).or_default() += t.position.sign() * t.volume;
        }

        let open = expected.values().filter(|v| **v != 0.0).count();
        prop_assert_eq!(entries.len(), open);
        for e in &entries {
            prop_assert!(e.volume > 0.0);
            assert_abs_diff_eq!(e.net_volume(), expected[e.symbol.as_str()], epsilon = 1e-9);
        }
    }
}
