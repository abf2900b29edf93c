mod classifier;
mod ledger;
mod session;
