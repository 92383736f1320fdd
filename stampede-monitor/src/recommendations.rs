//! Static per-component advice and combined recommendations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::severity::Severity;
use crate::types::{Bottleneck, Component};

/// An actionable recommendation in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Severity,
    pub title: String,
    pub actions: Vec<String>,
    pub components: Vec<Component>,
}

/// Advice attached to every bottleneck on `component`
pub fn component_recommendations(component: Component) -> Vec<String> {
    let advice: &[&str] = match component {
        Component::Cpu => &[
            "Scale horizontally by adding instances",
            "Profile and optimize hot code paths",
            "Move CPU-heavy work off the request path",
        ],
        Component::Memory => &[
            "Increase available memory or scale out",
            "Look for unbounded caches and buffers",
            "Reduce per-request allocations",
        ],
        Component::Heap => &[
            "Profile heap growth for leaks",
            "Bound in-process caches",
            "Stream large payloads instead of buffering them",
        ],
        Component::EventLoop => &[
            "Move blocking work to a dedicated thread pool",
            "Break up long-running synchronous sections",
        ],
        Component::Handles => &[
            "Check for leaked connections or tasks",
            "Apply connection pooling and limits",
        ],
        Component::ResponseTime => &[
            "Add caching for expensive responses",
            "Optimize slow endpoints and downstream calls",
            "Review timeouts on downstream dependencies",
        ],
        Component::ErrorRate => &[
            "Inspect error logs for the dominant failure",
            "Add retries with backoff for transient downstream failures",
            "Shed load before dependencies saturate",
        ],
        Component::Queue => &[
            "Increase worker or handler concurrency",
            "Apply backpressure or rate limiting upstream",
        ],
        Component::Database => &[
            "Add indexes for slow queries",
            "Tune the connection pool size",
            "Cache frequently read data",
        ],
        Component::Cache => &[
            "Review cache keys and TTLs",
            "Warm the cache for hot data",
            "Increase cache capacity",
        ],
    };
    advice.iter().map(|a| a.to_string()).collect()
}

/// Co-occurring components that point at a shared cause
struct Combination {
    components: [Component; 2],
    title: &'static str,
    actions: &'static [&'static str],
}

const COMBINATIONS: &[Combination] = &[
    Combination {
        components: [Component::Cpu, Component::Memory],
        title: "Resource scaling required",
        actions: &[
            "Both CPU and memory are saturated: add capacity before tuning code",
            "Enable auto-scaling on CPU and memory utilisation",
        ],
    },
    Combination {
        components: [Component::ResponseTime, Component::Queue],
        title: "Request-processing bottleneck",
        actions: &[
            "Requests are waiting for handlers: raise concurrency limits",
            "Profile the slowest handlers holding workers busy",
        ],
    },
    Combination {
        components: [Component::Heap, Component::EventLoop],
        title: "Runtime saturation",
        actions: &[
            "Memory pressure is stalling the scheduler: check for allocation hot spots",
            "Offload heavy computation from the async runtime",
        ],
    },
    Combination {
        components: [Component::Database, Component::ResponseTime],
        title: "Database-bound latency",
        actions: &[
            "Slow queries dominate response time: optimize or cache them",
            "Check connection pool saturation",
        ],
    },
];

/// Build report recommendations for the active bottlenecks
///
/// Combined recommendations come first and outrank the component advice
/// they summarize: they take the worst contributing severity, raised to at
/// least `High`. Component advice follows, one entry per component.
pub fn build_recommendations(bottlenecks: &[Bottleneck]) -> Vec<Recommendation> {
    let mut worst: BTreeMap<Component, Severity> = BTreeMap::new();
    for bottleneck in bottlenecks {
        let entry = worst.entry(bottleneck.component).or_insert(bottleneck.severity);
        *entry = (*entry).max(bottleneck.severity);
    }

    let mut combined = Vec::new();
    for combination in COMBINATIONS {
        let severities: Option<Vec<Severity>> = combination
            .components
            .iter()
            .map(|c| worst.get(c).copied())
            .collect();
        if let Some(severities) = severities {
            let priority = severities
                .into_iter()
                .max()
                .unwrap_or(Severity::High)
                .max(Severity::High);
            combined.push(Recommendation {
                priority,
                title: combination.title.to_string(),
                actions: combination.actions.iter().map(|a| a.to_string()).collect(),
                components: combination.components.to_vec(),
            });
        }
    }
    combined.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut individual: Vec<Recommendation> = worst
        .into_iter()
        .map(|(component, severity)| Recommendation {
            priority: severity,
            title: format!("Address {} pressure", component),
            actions: component_recommendations(component),
            components: vec![component],
        })
        .collect();
    individual.sort_by(|a, b| b.priority.cmp(&a.priority));

    combined.extend(individual);
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BottleneckType;
    use chrono::Utc;

    fn bottleneck(component: Component, severity: Severity) -> Bottleneck {
        let now = Utc::now();
        Bottleneck {
            kind: BottleneckType::System,
            component,
            metric: component.as_str().to_string(),
            value: 1.0,
            threshold: 1.0,
            severity,
            description: String::new(),
            recommendations: component_recommendations(component),
            occurrences: 1,
            first_seen: now,
            timestamp: now,
        }
    }

    #[test]
    fn test_every_component_has_advice() {
        for component in [
            Component::Cpu,
            Component::Memory,
            Component::Heap,
            Component::EventLoop,
            Component::Handles,
            Component::ResponseTime,
            Component::ErrorRate,
            Component::Queue,
            Component::Database,
            Component::Cache,
        ] {
            assert!(!component_recommendations(component).is_empty());
        }
    }

    #[test]
    fn test_cpu_and_memory_combine() {
        let recommendations = build_recommendations(&[
            bottleneck(Component::Cpu, Severity::Warning),
            bottleneck(Component::Memory, Severity::Medium),
        ]);

        assert_eq!(recommendations.len(), 3);
        assert_eq!(recommendations[0].title, "Resource scaling required");
        assert_eq!(recommendations[0].priority, Severity::High);
        assert_eq!(
            recommendations[0].components,
            vec![Component::Cpu, Component::Memory]
        );
        // Component advice sorted by severity
        assert_eq!(recommendations[1].components, vec![Component::Memory]);
        assert_eq!(recommendations[2].components, vec![Component::Cpu]);
    }

    #[test]
    fn test_combined_priority_takes_worst_severity() {
        let recommendations = build_recommendations(&[
            bottleneck(Component::ResponseTime, Severity::Critical),
            bottleneck(Component::Queue, Severity::Warning),
            bottleneck(Component::Database, Severity::Warning),
        ]);

        let titles: Vec<&str> = recommendations
            .iter()
            .filter(|r| r.components.len() == 2)
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Request-processing bottleneck"));
        assert!(titles.contains(&"Database-bound latency"));
        assert!(recommendations
            .iter()
            .filter(|r| r.components.len() == 2)
            .all(|r| r.priority == Severity::Critical));
    }

    #[test]
    fn test_single_component_has_no_combination() {
        let recommendations = build_recommendations(&[bottleneck(Component::Heap, Severity::High)]);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].title, "Address heap pressure");
        assert!(build_recommendations(&[]).is_empty());
    }
}
