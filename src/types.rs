/// Identifier of an advertiser
/// The total order on ids doubles as the deterministic tie-break when
/// two eligible bids score equally.
pub type AdvertiserId = u32;

/// A bid an advertiser placed on a keyword
/// An advertiser has at most one bid per keyword in the dataset.
#[derive(Debug, Clone)]
pub struct Bid {
    pub advertiser: AdvertiserId,
    pub keyword: String,
    pub value: f64,
}

/// Outcome of allocating one query: the winning advertiser and the
/// amount charged against its budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub advertiser: AdvertiserId,
    pub amount: f64,
}
