//! Account balance lookup.

use super::{Query, QueryData};
use crate::domain::{AccountBalance, AccountId, Result, SdkError};
use crate::wire::{QueryBody, Response, ResponseBody};

/// Balance lookup parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountBalanceData {
    account_id: AccountId,
}

/// Look up the balance of an account. Free.
pub type AccountBalanceQuery = Query<AccountBalanceData>;

impl AccountBalanceQuery {
    /// Balance of `account_id`.
    pub fn new(account_id: AccountId) -> Self {
        Self::from_data(AccountBalanceData { account_id })
    }
}

impl QueryData for AccountBalanceData {
    type Output = AccountBalance;

    fn name(&self) -> &str {
        "account_balance"
    }

    fn body(&self) -> QueryBody {
        QueryBody::AccountBalance {
            account_id: self.account_id.clone(),
        }
    }

    fn is_free(&self) -> bool {
        true
    }

    fn entity_ids(&self) -> Vec<&AccountId> {
        vec![&self.account_id]
    }

    fn map_response(&self, response: Response) -> Result<AccountBalance> {
        match response.body {
            ResponseBody::AccountBalance(balance) => Ok(balance),
            other => Err(SdkError::UnexpectedResponse(format!(
                "expected an account balance, got {other:?}"
            ))),
        }
    }
}
