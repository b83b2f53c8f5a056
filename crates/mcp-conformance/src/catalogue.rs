//! Declarative test catalogue.
//!
//! A catalogue is an ordered list of [`TestCase`] records; order is execution
//! and report order. The orchestrator runs every catalogue through the same
//! generic loop, so adding coverage means adding data, not code.
//!
//! [`default_catalogue`] is the built-in ethcli tool-server suite. A catalogue
//! can also be loaded from TOML with [`load_catalogue`]:
//!
//! ```toml
//! [[cases]]
//! tool = "cast_to_wei"
//! arguments = { amount = "1", unit = "eth" }
//!
//! [[cases]]
//! tool = "cowswap_auction"
//! expect_api_error = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::CatalogueError;

/// One tool invocation to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub tool: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// The tool is known to fail because of an upstream dependency.
    #[serde(default)]
    pub expect_api_error: bool,
}

impl TestCase {
    /// Build a case from a JSON object of arguments. Non-object values are
    /// treated as no arguments.
    pub fn new(tool: impl Into<String>, arguments: Value, expect_api_error: bool) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            tool: tool.into(),
            arguments,
            expect_api_error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(default)]
    cases: Vec<TestCase>,
}

/// Load a catalogue from a TOML file of `[[cases]]` tables.
///
/// # Errors
///
/// Returns [`CatalogueError`] if the file cannot be read or parsed, or if it
/// defines no cases.
pub fn load_catalogue(path: &Path) -> Result<Vec<TestCase>, CatalogueError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CatalogueError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CatalogueFile = toml::from_str(&contents).map_err(|source| CatalogueError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if file.cases.is_empty() {
        return Err(CatalogueError::Empty {
            path: path.to_path_buf(),
        });
    }
    tracing::info!(path = %path.display(), cases = file.cases.len(), "loaded catalogue");
    Ok(file.cases)
}

/// Keep only cases whose tool is named in `only`, preserving order.
/// An empty `only` keeps everything.
///
/// # Errors
///
/// Returns [`CatalogueError::UnknownTools`] if any name in `only` matches no
/// case.
pub fn select(
    catalogue: Vec<TestCase>,
    only: &[String],
) -> Result<Vec<TestCase>, CatalogueError> {
    if only.is_empty() {
        return Ok(catalogue);
    }
    let unknown: Vec<String> = only
        .iter()
        .filter(|name| !catalogue.iter().any(|c| &c.tool == *name))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(CatalogueError::UnknownTools(unknown));
    }
    Ok(catalogue
        .into_iter()
        .filter(|c| only.contains(&c.tool))
        .collect())
}

const VITALIK: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

/// The built-in suite for the ethcli tool server, grouped by tool family.
pub fn default_catalogue() -> Vec<TestCase> {
    let ok = |tool: &str, args: Value| TestCase::new(tool, args, false);
    let flaky = |tool: &str, args: Value| TestCase::new(tool, args, true);
    let one_eth = "1000000000000000000";

    vec![
        // cast: pure conversions
        ok("cast_to_wei", json!({"amount": "1", "unit": "eth"})),
        ok("cast_from_wei", json!({"wei": one_eth, "unit": "eth"})),
        ok("cast_to_hex", json!({"value": "255"})),
        ok("cast_to_dec", json!({"value": "0xff"})),
        ok("cast_keccak", json!({"value": "hello"})),
        ok("cast_sig", json!({"signature": "transfer(address,uint256)"})),
        ok("cast_topic", json!({"signature": "Transfer(address,address,uint256)"})),
        ok("cast_checksum", json!({"value": VITALIK.to_lowercase()})),
        ok("cast_to_bytes32", json!({"value": "0x1234"})),
        ok(
            "cast_abi_encode",
            json!({"sig": "transfer(address,uint256)", "args": [VITALIK, "1000000"]}),
        ),
        // sig
        ok("sig_fn", json!({"selector": "0xa9059cbb"})),
        ok(
            "sig_event",
            json!({"selector": "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"}),
        ),
        ok("sig_cache_stats", json!({})),
        // ens
        ok("ens_resolve", json!({"name": "vitalik.eth"})),
        ok("ens_lookup", json!({"address": VITALIK})),
        ok("ens_namehash", json!({"name": "vitalik.eth"})),
        // rpc
        ok("rpc_block_number", json!({})),
        ok("rpc_chain_id", json!({})),
        ok("rpc_gas_price", json!({})),
        ok("rpc_nonce", json!({"address": VITALIK})),
        ok("rpc_code", json!({"address": USDC})),
        ok("rpc_block", json!({"block": "latest"})),
        // account
        ok("account_balance", json!({"address": VITALIK})),
        ok("account_info", json!({"address": VITALIK})),
        // gas
        ok("gas_oracle", json!({})),
        // contract
        ok("contract_abi", json!({"address": USDC})),
        ok("contract_creation", json!({"address": USDC})),
        // token
        ok("token_info", json!({"address": USDC})),
        ok("token_balance", json!({"token": USDC, "address": VITALIK})),
        // address book
        ok("address_list", json!({})),
        ok("address_search", json!({"query": "vitalik"})),
        // blacklist
        ok("blacklist_list", json!({})),
        ok("blacklist_check", json!({"address": USDC})),
        // config
        ok("config_path", json!({})),
        ok("config_show", json!({})),
        ok("config_validate", json!({})),
        // endpoints
        ok("endpoints_list", json!({})),
        ok("endpoints_health", json!({})),
        // chainlink
        ok("chainlink_price", json!({"token": "ETH"})),
        ok("chainlink_oracles", json!({})),
        // goplus
        ok("goplus_chains", json!({})),
        ok("goplus_token", json!({"address": USDC, "chain_id": 1})),
        // llama
        ok("llama_stablecoins", json!({})),
        // curve
        ok("curve_pools", json!({})),
        ok("curve_crvusd", json!({})),
        ok("curve_dao", json!({})),
        ok("curve_volumes", json!({})),
        // ccxt
        ok("ccxt_ticker", json!({"exchange": "binance", "symbol": "BTC/USDT"})),
        ok("ccxt_markets", json!({"exchange": "binance"})),
        // pyth
        ok("pyth_price", json!({"symbols": "BTC/USD"})),
        ok("pyth_search", json!({"query": "ETH"})),
        ok("pyth_known_feeds", json!({})),
        // kyberswap
        ok(
            "kyberswap_routes",
            json!({"token_in": WETH, "token_out": USDC, "amount_in": one_eth}),
        ),
        // cowswap: the auction endpoint answers 403
        ok("cowswap_native_price", json!({"token": USDC})),
        flaky("cowswap_auction", json!({})),
        // lifi
        ok("lifi_chains", json!({})),
        ok("lifi_gas", json!({"chain_id": "1"})),
        ok("lifi_tools", json!({})),
        ok("lifi_bridges", json!({})),
        ok("lifi_exchanges", json!({})),
        // openocean: quotes are rate limited
        ok("openocean_tokens", json!({})),
        ok("openocean_dexes", json!({})),
        flaky(
            "openocean_quote",
            json!({"in_token": WETH, "out_token": USDC, "amount": one_eth}),
        ),
        // velora
        ok("velora_tokens", json!({})),
        // doctor: warnings are not errors
        ok("doctor", json!({})),
        // kong / yearn
        ok("kong_vaults", json!({})),
        flaky("kong_strategies", json!({})),
        // uniswap: subgraph needs THEGRAPH_API_KEY
        flaky("uniswap_eth_price", json!({})),
        flaky("uniswap_top_pools", json!({"limit": 5})),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_catalogue_is_ordered_and_unique() {
        let cases = default_catalogue();
        assert_eq!(cases.first().unwrap().tool, "cast_to_wei");
        assert_eq!(cases.last().unwrap().tool, "uniswap_top_pools");
        let mut names: Vec<&str> = cases.iter().map(|c| c.tool.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), cases.len(), "duplicate tool in default catalogue");
    }

    #[test]
    fn default_catalogue_flags_known_upstream_failures() {
        let flagged: Vec<String> = default_catalogue()
            .into_iter()
            .filter(|c| c.expect_api_error)
            .map(|c| c.tool)
            .collect();
        assert_eq!(
            flagged,
            vec![
                "cowswap_auction",
                "openocean_quote",
                "kong_strategies",
                "uniswap_eth_price",
                "uniswap_top_pools"
            ]
        );
    }

    #[test]
    fn new_with_non_object_arguments_is_empty() {
        let case = TestCase::new("x", json!([1, 2]), false);
        assert!(case.arguments.is_empty());
    }

    #[test]
    fn load_catalogue_from_toml_preserves_order_and_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[cases]]
tool = "second_alphabetically_but_first"
arguments = {{ amount = "1", nested = {{ limit = 5 }} }}

[[cases]]
tool = "a_flaky_one"
expect_api_error = true
"#
        )
        .unwrap();

        let cases = load_catalogue(file.path()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].tool, "second_alphabetically_but_first");
        assert_eq!(cases[0].arguments["amount"], "1");
        assert_eq!(cases[0].arguments["nested"]["limit"], 5);
        assert!(!cases[0].expect_api_error);
        assert_eq!(cases[1].tool, "a_flaky_one");
        assert!(cases[1].arguments.is_empty());
        assert!(cases[1].expect_api_error);
    }

    #[test]
    fn load_catalogue_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_catalogue(file.path()).unwrap_err();
        assert!(matches!(err, CatalogueError::Empty { .. }));
    }

    #[test]
    fn load_catalogue_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[cases]]\ntool = 42").unwrap();
        let err = load_catalogue(file.path()).unwrap_err();
        assert!(matches!(err, CatalogueError::Parse { .. }));
    }

    #[test]
    fn load_catalogue_reports_missing_file() {
        let err = load_catalogue(Path::new("/nonexistent/catalogue.toml")).unwrap_err();
        assert!(matches!(err, CatalogueError::Read { .. }));
    }

    #[test]
    fn select_keeps_catalogue_order() {
        let only = vec!["rpc_chain_id".to_string(), "cast_to_hex".to_string()];
        let picked: Vec<String> = select(default_catalogue(), &only)
            .unwrap()
            .into_iter()
            .map(|c| c.tool)
            .collect();
        assert_eq!(picked, vec!["cast_to_hex", "rpc_chain_id"]);
    }

    #[test]
    fn select_with_empty_filter_keeps_everything() {
        assert_eq!(
            select(default_catalogue(), &[]).unwrap().len(),
            default_catalogue().len()
        );
    }

    #[test]
    fn select_rejects_unknown_tool_names() {
        let only = vec!["cast_to_hex".to_string(), "cast_to_hexx".to_string()];
        let err = select(default_catalogue(), &only).unwrap_err();
        match err {
            CatalogueError::UnknownTools(names) => assert_eq!(names, vec!["cast_to_hexx"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
