pub mod amount;
pub mod bill;
pub mod clock;
mod error;

pub use amount::{clean_description, format_amount, format_whole, parse_amount, round_whole};
pub use bill::{
    AnalyzedBill, BillMetadata, BillSource, Charge, FlagKind, FlaggedCharge, LetterOptions,
    PatientInfo, PaymentType, Provider, Strategy, total_of,
};
pub use clock::{Clock, Entropy, FixedClock, SeededEntropy, SystemClock, ThreadEntropy};
pub use error::{CoreError, load_json};
