mod diagnostics;
mod helpers;
mod mocks;
mod reconcile;
