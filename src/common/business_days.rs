// src/common/business_days.rs
//
// Aritmética de dias úteis (segunda a sexta). Feriados não são considerados.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Conta os dias úteis no intervalo semiaberto `[start, end)`.
pub fn count_business_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end <= start {
        return 0;
    }

    let total_days = (end - start).num_days();
    let full_weeks = total_days / 7;
    let mut count = full_weeks * 5;

    // Sobra menor que uma semana: contamos dia a dia.
    let mut cursor = start + Duration::days(full_weeks * 7);
    while cursor < end {
        if is_business_day(cursor) {
            count += 1;
        }
        cursor += Duration::days(1);
    }
    count
}

/// Avança `days` dias úteis a partir de `start`, pulando fins de semana.
/// `None` quando o resultado passa do limite do calendário.
pub fn add_business_days(start: NaiveDate, days: u32) -> Option<NaiveDate> {
    if days == 0 {
        return Some(start);
    }

    // Quaisquer 7 dias seguidos têm exatamente 5 dias úteis.
    let weeks = (days - 1) / 5;
    let mut cursor = start.checked_add_signed(Duration::weeks(i64::from(weeks)))?;
    let mut remaining = days - weeks * 5;
    while remaining > 0 {
        cursor = cursor.succ_opt()?;
        if is_business_day(cursor) {
            remaining -= 1;
        }
    }
    Some(cursor)
}

/// O próprio dia se for útil, senão a segunda-feira seguinte.
/// No fim do calendário fica no último dia disponível.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut cursor = date;
    while !is_business_day(cursor) {
        match cursor.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    cursor
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Dias úteis do mês inteiro. Mês inválido resulta em 0.
pub fn business_days_in_month(year: i32, month: u32) -> i64 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(next) => count_business_days(first, next),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekends_are_not_business_days() {
        // 2025-03-01 é sábado.
        assert!(!is_business_day(d(2025, 3, 1)));
        assert!(!is_business_day(d(2025, 3, 2)));
        assert!(is_business_day(d(2025, 3, 3)));
    }

    #[test]
    fn count_uses_half_open_range() {
        // Segunda a segunda: 5 dias úteis.
        assert_eq!(count_business_days(d(2025, 3, 3), d(2025, 3, 10)), 5);
        // Segunda a sexta (exclusivo): 4.
        assert_eq!(count_business_days(d(2025, 3, 3), d(2025, 3, 7)), 4);
        // Sábado a segunda: nenhum.
        assert_eq!(count_business_days(d(2025, 3, 1), d(2025, 3, 3)), 0);
    }

    #[test]
    fn count_is_zero_for_empty_or_reversed_ranges() {
        assert_eq!(count_business_days(d(2025, 3, 3), d(2025, 3, 3)), 0);
        assert_eq!(count_business_days(d(2025, 3, 10), d(2025, 3, 3)), 0);
    }

    #[test]
    fn count_matches_day_by_day_walk_over_long_range() {
        let start = d(2024, 1, 1);
        let end = d(2024, 12, 31);
        let mut expected = 0;
        let mut cursor = start;
        while cursor < end {
            if is_business_day(cursor) {
                expected += 1;
            }
            cursor += Duration::days(1);
        }
        assert_eq!(count_business_days(start, end), expected);
    }

    #[test]
    fn add_skips_weekends() {
        // Sexta + 1 dia útil = segunda.
        assert_eq!(add_business_days(d(2025, 3, 7), 1), Some(d(2025, 3, 10)));
        // Segunda + 5 = segunda seguinte.
        assert_eq!(add_business_days(d(2025, 3, 3), 5), Some(d(2025, 3, 10)));
        // Zero dias não move a data, mesmo num sábado.
        assert_eq!(add_business_days(d(2025, 3, 1), 0), Some(d(2025, 3, 1)));
        // Sábado + 1 = segunda.
        assert_eq!(add_business_days(d(2025, 3, 1), 1), Some(d(2025, 3, 3)));
        // Sábado + 5 = sexta seguinte, não o sábado.
        assert_eq!(add_business_days(d(2025, 3, 1), 5), Some(d(2025, 3, 7)));
    }

    #[test]
    fn add_matches_day_by_day_walk() {
        for offset in 0..7 {
            let start = d(2025, 3, 1) + Duration::days(offset);
            for days in 0..40u32 {
                let mut expected = start;
                let mut remaining = days;
                while remaining > 0 {
                    expected += Duration::days(1);
                    if is_business_day(expected) {
                        remaining -= 1;
                    }
                }
                assert_eq!(add_business_days(start, days), Some(expected), "{} + {}", start, days);
            }
        }
    }

    #[test]
    fn add_returns_none_past_the_calendar_limit() {
        assert_eq!(add_business_days(d(2025, 3, 3), u32::MAX), None);
        assert_eq!(add_business_days(NaiveDate::MAX, 1), None);
    }

    #[test]
    fn next_business_day_stops_at_calendar_end() {
        assert_eq!(next_business_day(NaiveDate::MAX), NaiveDate::MAX);
    }

    #[test]
    fn next_business_day_moves_weekends_to_monday() {
        assert_eq!(next_business_day(d(2025, 3, 1)), d(2025, 3, 3));
        assert_eq!(next_business_day(d(2025, 3, 2)), d(2025, 3, 3));
        assert_eq!(next_business_day(d(2025, 3, 4)), d(2025, 3, 4));
    }

    #[test]
    fn business_days_in_known_months() {
        // Março/2025: 21 dias úteis. Fevereiro/2024 (bissexto): 21.
        assert_eq!(business_days_in_month(2025, 3), 21);
        assert_eq!(business_days_in_month(2024, 2), 21);
        // Dezembro vira o ano corretamente.
        assert_eq!(business_days_in_month(2025, 12), 23);
        assert_eq!(business_days_in_month(2025, 13), 0);
    }
}
