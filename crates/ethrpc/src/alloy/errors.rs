use alloy::{contract::Error as ContractError, sol_types::decode_revert_reason, transports::RpcError};

/// Bubbles up node errors, ignoring all other errors.
///
/// Used where a revert is an expected answer, e.g. reading a position that
/// was burned.
pub fn ignore_non_node_error<T>(result: Result<T, ContractError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.is_node_error() => Err(err.into()),
        Err(err) => {
            tracing::debug!(reason = %err.revert_reason(), "ignoring contract error");
            Ok(None)
        }
    }
}

pub trait ContractErrorExt {
    /// Returns whether a given error is a contract error, this is considered to
    /// be all errors except the transport error where there is no revert data.
    fn is_contract_error(&self) -> bool;

    /// Returns whether a given error is a node error.
    fn is_node_error(&self) -> bool;

    /// Human readable reason: the decoded revert string if the contract
    /// returned one, otherwise the error itself.
    fn revert_reason(&self) -> String;
}

impl ContractErrorExt for ContractError {
    fn is_contract_error(&self) -> bool {
        !self.is_node_error()
    }

    fn is_node_error(&self) -> bool {
        // Some contract errors are hidden inside transport errors in alloy, so a
        // transport error only counts as a node error if it carries no revert
        // data. Empty revert data (e.g. calling a missing function) still counts
        // as a revert.
        match self {
            ContractError::TransportError(RpcError::ErrorResp(err)) => {
                let no_revert_data = err.as_revert_data().is_none();
                tracing::debug!(?err, %no_revert_data, "transport rpc error");
                no_revert_data
            }
            ContractError::TransportError(_) => true,
            _ => false,
        }
    }

    fn revert_reason(&self) -> String {
        self.as_revert_data()
            .and_then(|data| decode_revert_reason(&data))
            .unwrap_or_else(|| self.to_string())
    }
}
