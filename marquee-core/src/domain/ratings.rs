use marquee_model::{RatingStats, RatingValue};

/// Mean and count over the full set of rating values for one movie.
pub fn aggregate<I>(values: I) -> RatingStats
where
    I: IntoIterator<Item = RatingValue>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u32), |(sum, count), value| {
            (sum + u64::from(value.get()), count + 1)
        });

    if count == 0 {
        return RatingStats::EMPTY;
    }

    RatingStats {
        average: sum as f64 / f64::from(count),
        count,
    }
}
