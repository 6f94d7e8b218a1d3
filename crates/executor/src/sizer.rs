//! Capital sizing seam

use async_trait::async_trait;

use triarb_core::{LoanAmount, SizingConfig, SizingResult};

/// Decides how much to flash-borrow for one cycle. Zero means "do not try".
#[async_trait]
pub trait CapitalSizer: Send + Sync {
    async fn loan_amount(&self) -> SizingResult<LoanAmount>;
}

/// Always proposes the configured amount
#[derive(Debug, Clone)]
pub struct StaticSizer {
    amount: LoanAmount,
}

impl StaticSizer {
    pub fn new(amount: LoanAmount) -> Self {
        Self { amount }
    }

    pub fn from_config(config: &SizingConfig) -> Self {
        Self::new(config.loan_amount_wei)
    }
}

#[async_trait]
impl CapitalSizer for StaticSizer {
    async fn loan_amount(&self) -> SizingResult<LoanAmount> {
        Ok(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[tokio::test]
    async fn test_static_sizer() {
        let sizer = StaticSizer::from_config(&SizingConfig::default());
        assert_eq!(
            sizer.loan_amount().await.unwrap(),
            U256::from(10_000_000_000_000_000_000u128)
        );
    }
}
