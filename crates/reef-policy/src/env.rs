use std::str::FromStr;

use anyhow::Context;

use crate::{AbiPolicy, Granularity, ImplicitResult};

pub const ENV_ALLOC_GRANULARITY: &str = "REEF_ALLOC_GRANULARITY";
pub const ENV_IMPLICIT_RESULT: &str = "REEF_IMPLICIT_RESULT";

fn read_env<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };
    let value = T::from_str(&raw).with_context(|| format!("invalid environment variable {name}={raw:?}"))?;
    Ok(Some(value))
}

/// Flags win over the environment, the environment wins over defaults.
pub fn resolve_policy_with_env(
    cli_granularity: Option<Granularity>,
    cli_implicit_result: Option<ImplicitResult>,
    env_granularity: Option<Granularity>,
    env_implicit_result: Option<ImplicitResult>,
) -> AbiPolicy {
    AbiPolicy {
        granularity: cli_granularity.or(env_granularity).unwrap_or_default(),
        implicit_result: cli_implicit_result
            .or(env_implicit_result)
            .unwrap_or_default(),
    }
}

pub fn resolve_policy(
    cli_granularity: Option<Granularity>,
    cli_implicit_result: Option<ImplicitResult>,
) -> anyhow::Result<AbiPolicy> {
    let env_granularity = read_env::<Granularity>(ENV_ALLOC_GRANULARITY)?;
    let env_implicit_result = read_env::<ImplicitResult>(ENV_IMPLICIT_RESULT)?;
    Ok(resolve_policy_with_env(
        cli_granularity,
        cli_implicit_result,
        env_granularity,
        env_implicit_result,
    ))
}
