//! Service tests: mutations, layout pipeline, and pure layout helpers.

mod helpers;
mod support;
