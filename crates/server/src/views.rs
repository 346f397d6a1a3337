//! Conversions between engine types and API payloads.

use api_types::{PageQuery, account::AccountView, entry::EntryView, transfer::TransferView};
use engine::{Account, DEFAULT_PAGE_LIMIT, Entry, Page, ResultEngine, Transfer};

pub fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Cad => api_types::Currency::Cad,
        engine::Currency::Vnd => api_types::Currency::Vnd,
    }
}

pub fn engine_currency(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Cad => engine::Currency::Cad,
        api_types::Currency::Vnd => engine::Currency::Vnd,
    }
}

pub fn page(page: Option<u64>, limit: Option<u64>) -> ResultEngine<Page> {
    Page::new(page.unwrap_or(1), limit.unwrap_or(DEFAULT_PAGE_LIMIT))
}

pub fn page_from_query(query: PageQuery) -> ResultEngine<Page> {
    page(query.page, query.limit)
}

pub fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        owner: account.owner,
        currency: map_currency(account.currency),
        balance: account.balance,
        created_at: account.created_at,
    }
}

pub fn entry_view(entry: Entry) -> EntryView {
    EntryView {
        id: entry.id,
        account_id: entry.account_id,
        transfer_id: entry.transfer_id,
        amount: entry.amount,
        created_at: entry.created_at,
    }
}

pub fn transfer_view(transfer: Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        from_account_id: transfer.from_account_id,
        to_account_id: transfer.to_account_id,
        amount: transfer.amount,
        created_at: transfer.created_at,
    }
}
