//! Read-only smart-contract query types.
//!
//! A [`ScQuery`] is the proxy-side shape; [`VmValueRequest`] is what goes on
//! the wire to an observer's `/vm-values/query` endpoint, with arguments
//! hex-encoded. The observer answers with a [`VmOutput`] whose `returnData`
//! entries are base64.

use serde::{Deserialize, Serialize};

/// A read-only smart-contract invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScQuery {
    /// Bech32-encoded contract address.
    pub sc_address: String,
    /// Function to invoke.
    pub func_name: String,
    /// Raw call arguments.
    pub arguments: Vec<Vec<u8>>,
    /// Optional caller address.
    pub caller: Option<String>,
    /// Optional value transferred with the call.
    pub value: Option<String>,
}

impl ScQuery {
    /// Query with no caller and no value.
    pub fn new(sc_address: impl Into<String>, func_name: impl Into<String>) -> Self {
        Self {
            sc_address: sc_address.into(),
            func_name: func_name.into(),
            arguments: Vec::new(),
            caller: None,
            value: None,
        }
    }

    /// Append a raw argument.
    pub fn with_argument(mut self, argument: impl Into<Vec<u8>>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// The wire shape expected by observers.
    pub fn to_request(&self) -> VmValueRequest {
        VmValueRequest {
            sc_address: self.sc_address.clone(),
            func_name: self.func_name.clone(),
            args: self.arguments.iter().map(hex::encode).collect(),
            caller: self.caller.clone(),
            value: self.value.clone(),
        }
    }
}

/// Wire shape of `/vm-values/query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmValueRequest {
    /// Bech32-encoded contract address.
    #[serde(rename = "scAddress")]
    pub sc_address: String,
    /// Function to invoke.
    #[serde(rename = "funcName")]
    pub func_name: String,
    /// Hex-encoded call arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Optional caller address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    /// Optional transferred value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// VM execution output as reported by an observer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmOutput {
    /// Return values, base64-encoded.
    #[serde(rename = "returnData", default)]
    pub return_data: Vec<String>,
    /// VM return code, `ok` on success.
    #[serde(rename = "returnCode", default)]
    pub return_code: String,
    /// Detail accompanying a non-ok return code.
    #[serde(rename = "returnMessage", default, skip_serializing_if = "String::is_empty")]
    pub return_message: String,
}

/// `data` payload of `/vm-values/query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmValuesData {
    /// The VM output.
    #[serde(default)]
    pub data: VmOutput,
}
