/*
 *  sun.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Sunrise/sunset and day/night for the configured location
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */
//! Sunrise/Sunset for a given lat/lon and date (NOAA algorithm, zenith 90.833°).
//! Times are UTC; callers shift to local time for display.

use chrono::{prelude::*, Duration};

const ZENITH_DEG: f64 = 90.833_f64; // "official" sunrise/sunset (refraction accounted)
const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunTimes {
    pub sunrise_utc: Option<DateTime<Utc>>,
    pub sunset_utc: Option<DateTime<Utc>>,
}

#[inline]
fn sin_deg(x: f64) -> f64 { (x * DEG_TO_RAD).sin() }
#[inline]
fn cos_deg(x: f64) -> f64 { (x * DEG_TO_RAD).cos() }
#[inline]
fn tan_deg(x: f64) -> f64 { (x * DEG_TO_RAD).tan() }
#[inline]
fn acos_deg(x: f64) -> f64 { x.acos() * RAD_TO_DEG }
#[inline]
fn atan_deg(x: f64) -> f64 { x.atan() * RAD_TO_DEG }

/// Normalize angle to [0,360)
fn norm360(x: f64) -> f64 {
    let a = x % 360.0;
    if a < 0.0 { a + 360.0 } else { a }
}

/// UT hours of rising (or setting) on day-of-year `n`; None when the sun
/// stays above or below the horizon all day.
fn compute_ut(lat_deg: f64, lon_deg: f64, n: f64, is_rise: bool) -> Option<f64> {
    let lng_hour = lon_deg / 15.0;
    let t = if is_rise {
        n + (6.0 - lng_hour) / 24.0
    } else {
        n + (18.0 - lng_hour) / 24.0
    };

    // mean anomaly, true longitude
    let m = 0.9856 * t - 3.289;
    let l = norm360(m + 1.916 * sin_deg(m) + 0.020 * sin_deg(2.0 * m) + 282.634);

    // right ascension, same quadrant as L
    let ra = norm360(atan_deg(0.91764 * tan_deg(l)));
    let l_quadrant = (l / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;
    let ra = (ra + (l_quadrant - ra_quadrant)) / 15.0;

    let sin_dec = 0.39782 * sin_deg(l);
    let cos_dec = (1.0 - sin_dec * sin_dec).sqrt();
    let cos_h = (cos_deg(ZENITH_DEG) - sin_dec * sin_deg(lat_deg)) / (cos_dec * cos_deg(lat_deg));
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }

    let h = (if is_rise { 360.0 - acos_deg(cos_h) } else { acos_deg(cos_h) }) / 15.0;
    let t_local = h + ra - (0.06571 * t) - 6.622;
    let ut = t_local - lng_hour;
    Some(((ut % 24.0) + 24.0) % 24.0)
}

fn ut_hours_to_utc(date: NaiveDate, ut_hours: f64) -> DateTime<Utc> {
    let seconds = (ut_hours * 3600.0).round() as i64;
    let midnight = date.and_time(NaiveTime::default());
    DateTime::<Utc>::from_naive_utc_and_offset(midnight + Duration::seconds(seconds), Utc)
}

/// sunrise/sunset for a specific date (UTC civil date).
pub fn sun_times_for_date(lat_deg: f64, lon_deg: f64, date: NaiveDate) -> SunTimes {
    let n = date.ordinal() as f64;
    SunTimes {
        sunrise_utc: compute_ut(lat_deg, lon_deg, n, true).map(|h| ut_hours_to_utc(date, h)),
        sunset_utc: compute_ut(lat_deg, lon_deg, n, false).map(|h| ut_hours_to_utc(date, h)),
    }
}

/// Whether `now` falls between sunrise and sunset. None during polar
/// day or night.
pub fn is_day_at(lat_deg: f64, lon_deg: f64, now: DateTime<Utc>) -> Option<bool> {
    let times = sun_times_for_date(lat_deg, lon_deg, now.date_naive());
    let (rise, set) = (times.sunrise_utc?, times.sunset_utc?);
    // far from Greenwich the UTC day can hold the sunset before the sunrise
    Some(if rise < set {
        now >= rise && now < set
    } else {
        now >= rise || now < set
    })
}
