use aqi_core::{categorize, encode, AqiCategory, AqiError, FeatureSchema, PredictionRequest};
use proptest::prelude::*;

// Property-based tests for feature encoding and AQI banding

const CITIES: [&str; 4] = ["Delhi", "Mumbai", "Kolkata", "Bengaluru"];

fn schema() -> FeatureSchema {
    let mut columns = vec!["Month".to_string(), "Date_".to_string(), "Year".to_string()];
    columns.extend(CITIES.iter().map(|c| format!("City_{c}")));
    FeatureSchema::with_default_keys(columns).unwrap()
}

fn rank(category: AqiCategory) -> usize {
    AqiCategory::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(usize::MAX)
}

proptest! {
    #[test]
    fn supported_city_sets_exactly_one_slot(
        city_idx in 0usize..CITIES.len(),
        month in -100i64..100,
        day in -100i64..100,
        year in 1900i64..2200,
    ) {
        let schema = schema();
        let request = PredictionRequest::new(CITIES[city_idx], month, day, year);
        let features = encode(&schema, &request).unwrap();

        prop_assert_eq!(features.len(), schema.len());
        prop_assert_eq!(&features[..3], &[month as f64, day as f64, year as f64][..]);

        let hot: Vec<usize> = schema
            .cities()
            .indices()
            .filter(|&idx| features[idx] != 0.0)
            .collect();
        prop_assert_eq!(hot, vec![3 + city_idx]);
    }

    #[test]
    fn unknown_city_always_rejected(city in "[a-z]{1,12}") {
        let request = PredictionRequest::new(city.clone(), 6, 1, 2023);
        let err = encode(&schema(), &request).unwrap_err();
        prop_assert_eq!(err, AqiError::UnsupportedCity { city });
    }

    #[test]
    fn encoding_is_idempotent(city_idx in 0usize..CITIES.len(), month in 1i64..=12) {
        let schema = schema();
        let request = PredictionRequest::new(CITIES[city_idx], month, 1, 2023);
        let first = encode(&schema, &request).unwrap();
        let second = encode(&schema, &request).unwrap();
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn categories_never_decrease(a in -1000.0f64..1000.0, b in -1000.0f64..1000.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank(categorize(low)) <= rank(categorize(high)));
    }

    #[test]
    fn every_score_has_a_band(score in proptest::num::f64::ANY) {
        prop_assert!(rank(categorize(score)) < AqiCategory::ALL.len());
    }
}
