use async_trait::async_trait;
use chordex_common::BusError;
use serde_json::Value;

/// The object bound to a channel. Requests are matched against
/// [`Handler::methods`] by name before [`Handler::call`] runs.
#[async_trait]
pub trait Handler: Send + Sync {
    fn methods(&self) -> &'static [&'static str];

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, BusError>;

    fn has_method(&self, method: &str) -> bool {
        self.methods().contains(&method)
    }
}

/// The string argument at `index`, or a `BadArguments` error.
pub fn arg_str<'a>(
    args: &'a [Value],
    index: usize,
    channel: &str,
    method: &str,
) -> Result<&'a str, BusError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| BusError::BadArguments {
            channel: channel.to_string(),
            method: method.to_string(),
            reason: format!("argument {index} must be a string"),
        })
}
