//! Probabilistic alternative engine.
//!
//! Priors and Laplace-smoothed likelihoods are learned once from historical
//! `(root cause, evidence type, evidence value)` rows; each investigation
//! then runs in its own [`BayesSession`], multiplying in evidence as it
//! arrives and renormalizing so the posteriors always sum to one.
//!
//! ```
//! use domain::bayes::{BayesModel, TrainingRecord};
//!
//! let model = BayesModel::train(&[
//!     TrainingRecord::new("FW_01:Hardware/Physical", "alarm", "Heartbeat Loss"),
//!     TrainingRecord::new("WAN_01:Config/Software", "alarm", "BGP Flapping"),
//! ])?;
//! let mut session = model.session();
//! session.update_evidence("alarm", "Heartbeat Loss");
//! assert_eq!(session.ranking()[0].device_id, "FW_01");
//! # Ok::<(), domain::bayes::BayesError>(())
//! ```

mod model;
mod session;

pub use model::{BayesError, BayesModel, Evidence, TrainingRecord, LAPLACE_ALPHA};
pub use session::{BayesSession, EvidenceUpdate};
