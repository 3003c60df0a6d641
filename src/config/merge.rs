//! Configuration merging utilities
//!
//! This module provides functions to merge configuration from files
//! with command-line arguments, where CLI arguments take precedence.

use super::args::ServerArgs;
use super::defaults::*;
use super::file::ConfigFile;

/// Merge configuration file values with CLI arguments.
/// CLI arguments take precedence over config file values.
/// Only applies config file values where CLI uses defaults.
pub fn merge_config_with_args(mut args: ServerArgs, config: &ConfigFile) -> ServerArgs {
    macro_rules! apply_if_default {
        ($field:ident, $config_val:expr, $default:expr) => {
            if let Some(val) = $config_val {
                if args.$field == $default {
                    args.$field = val;
                }
            }
        };
    }

    macro_rules! apply_if_default_string {
        ($field:ident, $config_val:expr, $default:expr) => {
            if let Some(ref val) = $config_val {
                if args.$field == $default {
                    args.$field = val.clone();
                }
            }
        };
    }

    if args.bootstrap_servers.is_none() {
        args.bootstrap_servers = config.kafka.bootstrap_servers.clone();
    }
    apply_if_default_string!(client_id, config.kafka.client_id, DEFAULT_CLIENT_ID);

    apply_if_default_string!(transport, config.server.transport, DEFAULT_TRANSPORT);
    apply_if_default_string!(http_addr, config.server.http_addr, DEFAULT_HTTP_ADDR);
    apply_if_default_string!(log_level, config.server.log_level, DEFAULT_LOG_LEVEL);

    apply_if_default!(
        metadata_timeout_secs,
        config.timeouts.metadata_secs,
        DEFAULT_METADATA_TIMEOUT_SECS
    );
    apply_if_default!(
        flush_timeout_secs,
        config.timeouts.flush_secs,
        DEFAULT_FLUSH_TIMEOUT_SECS
    );
    apply_if_default!(
        poll_interval_ms,
        config.timeouts.poll_interval_ms,
        DEFAULT_POLL_INTERVAL_MS
    );
    apply_if_default!(
        operation_timeout_secs,
        config.timeouts.operation_secs,
        DEFAULT_OPERATION_TIMEOUT_SECS
    );

    args
}
