use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::activity::Activity;
use crate::codec::{compare_doubles, format_double};

/// Body mass index. Height is in metres; nothing is validated, so a zero
/// height gives infinity or NaN.
pub fn calculate_bmi(weight_kg: f64, height_m: f64) -> f64 {
    weight_kg / (height_m * height_m)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    NormalWeight,
    Overweight,
    Obesity,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::NormalWeight
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obesity
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obesity => "Obesity",
        })
    }
}

/// A user together with everything they recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardUser {
    pub id: String,
    pub name: String,
    /// Kilograms.
    pub weight: f64,
    /// Metres.
    pub height: f64,
    pub age: i32,
    pub gender: String,
    pub weight_history: Vec<f64>,
    /// Chronological entry order.
    pub activities: Vec<Activity>,
}

/// Aggregates over a user's activities. Averages of an empty list are NaN.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityStats {
    pub count: usize,
    pub total_duration: f64,
    pub average_duration: f64,
    pub total_calories: f64,
    pub average_calories: f64,
    pub longest: Option<Activity>,
    pub shortest: Option<Activity>,
    pub most_effective: Option<Activity>,
    pub calories_by_type: BTreeMap<String, f64>,
}

impl StandardUser {
    pub fn bmi(&self) -> f64 {
        calculate_bmi(self.weight, self.height)
    }

    /// Refreshes every activity's duration from its timestamps, then averages.
    pub fn average_activity_time(&mut self) -> f64 {
        let total: f64 = self
            .activities
            .iter_mut()
            .map(|a| a.calculate_duration())
            .sum();
        total / self.activities.len() as f64
    }

    pub fn average_activity_calories(&self) -> f64 {
        self.total_burned_calories() / self.activities.len() as f64
    }

    pub fn total_activity_time(&self) -> f64 {
        self.activities.iter().map(|a| a.duration).sum()
    }

    pub fn total_burned_calories(&self) -> f64 {
        self.activities.iter().map(|a| a.burned_calories).sum()
    }

    pub fn longest_activity(&self) -> Option<&Activity> {
        first_extreme(&self.activities, |a| a.duration, Ordering::Greater)
    }

    pub fn shortest_activity(&self) -> Option<&Activity> {
        first_extreme(&self.activities, |a| a.duration, Ordering::Less)
    }

    pub fn most_effective_activity(&self) -> Option<&Activity> {
        first_extreme(&self.activities, Activity::calories_per_minute, Ordering::Greater)
    }

    /// Calories summed per activity name.
    pub fn calories_by_type(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for activity in &self.activities {
            *totals.entry(activity.name.clone()).or_insert(0.0) += activity.burned_calories;
        }
        totals
    }

    pub fn stats(&mut self) -> ActivityStats {
        let average_duration = self.average_activity_time();
        ActivityStats {
            count: self.activities.len(),
            total_duration: self.total_activity_time(),
            average_duration,
            total_calories: self.total_burned_calories(),
            average_calories: self.average_activity_calories(),
            longest: self.longest_activity().cloned(),
            shortest: self.shortest_activity().cloned(),
            most_effective: self.most_effective_activity().cloned(),
            calories_by_type: self.calories_by_type(),
        }
    }

    /// Multi-line profile and activity summary.
    pub fn all_info(&mut self) -> String {
        let average_time = self.average_activity_time();
        let mut info = String::new();
        info.push_str(&format!("Name: {}\n", self.name));
        info.push_str(&format!("Weight: {}\n", format_double(self.weight)));
        info.push_str(&format!("Height: {}\n", format_double(self.height)));
        info.push_str(&format!("Age: {}\n", self.age));
        info.push_str(&format!("Gender: {}\n", self.gender));
        info.push_str(&format!(
            "Total activity time: {} mins [Avg: {} mins]\n",
            format_double(self.total_activity_time()),
            format_double(average_time)
        ));
        info.push_str(&format!(
            "Total burnt calories: {} kcal [Avg: {} kcal]\n",
            format_double(self.total_burned_calories()),
            format_double(self.average_activity_calories())
        ));
        match self.longest_activity() {
            Some(a) => info.push_str(&format!(
                "Longest activity: {}: {} mins\n",
                a.name,
                format_double(a.duration)
            )),
            None => info.push_str("Longest activity: N/A\n"),
        }
        match self.most_effective_activity() {
            Some(a) => info.push_str(&format!(
                "Most effective activity: {}: {} kcal/min\n",
                a.name,
                format_double(a.calories_per_minute())
            )),
            None => info.push_str("Most effective activity: N/A\n"),
        }
        info
    }
}

// Ties keep the earliest activity.
fn first_extreme<F>(activities: &[Activity], key: F, wanted: Ordering) -> Option<&Activity>
where
    F: Fn(&Activity) -> f64,
{
    let mut best: Option<&Activity> = None;
    for activity in activities {
        best = match best {
            Some(current) if compare_doubles(key(activity), key(current)) != wanted => Some(current),
            _ => Some(activity),
        };
    }
    best
}
