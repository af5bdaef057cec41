//! Catalog of backend collections the dashboards read and write.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Tickets,
    Inventory,
    PurchaseOrders,
    Bookings,
    PatrolRoutes,
    RosterTemplates,
    Visitors,
    Permits,
    Buildings,
    Wings,
    Areas,
    Floors,
    Rooms,
    Categories,
    SubCategories,
}

/// Every resource, in dashboard menu order.
pub const ALL_RESOURCES: &[Resource] = &[
    Resource::Tickets,
    Resource::Inventory,
    Resource::PurchaseOrders,
    Resource::Bookings,
    Resource::PatrolRoutes,
    Resource::RosterTemplates,
    Resource::Visitors,
    Resource::Permits,
    Resource::Buildings,
    Resource::Wings,
    Resource::Areas,
    Resource::Floors,
    Resource::Rooms,
    Resource::Categories,
    Resource::SubCategories,
];

/// Building -> wing -> area -> floor -> room.
pub const LOCATION_CASCADE: &[Resource] = &[
    Resource::Buildings,
    Resource::Wings,
    Resource::Areas,
    Resource::Floors,
    Resource::Rooms,
];

/// Category -> subcategory.
pub const CATEGORY_CASCADE: &[Resource] = &[Resource::Categories, Resource::SubCategories];

impl Resource {
    /// Snake-case name, also accepted by [`Resource::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tickets => "tickets",
            Self::Inventory => "inventory",
            Self::PurchaseOrders => "purchase_orders",
            Self::Bookings => "bookings",
            Self::PatrolRoutes => "patrol_routes",
            Self::RosterTemplates => "roster_templates",
            Self::Visitors => "visitors",
            Self::Permits => "permits",
            Self::Buildings => "buildings",
            Self::Wings => "wings",
            Self::Areas => "areas",
            Self::Floors => "floors",
            Self::Rooms => "rooms",
            Self::Categories => "categories",
            Self::SubCategories => "sub_categories",
        }
    }

    /// Path below the base URL, without the `.json` suffix.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Tickets => "pms/admin/complaints",
            Self::Inventory => "pms/inventories",
            Self::PurchaseOrders => "pms/purchase_orders",
            Self::Bookings => "pms/admin/facility_bookings",
            Self::PatrolRoutes => "pms/admin/patrollings",
            Self::RosterTemplates => "pms/admin/user_roasters",
            Self::Visitors => "pms/visitors",
            Self::Permits => "pms/permits",
            Self::Buildings => "pms/buildings",
            Self::Wings => "pms/wings",
            Self::Areas => "pms/areas",
            Self::Floors => "pms/floors",
            Self::Rooms => "pms/units",
            Self::Categories => "pms/admin/helpdesk_categories",
            Self::SubCategories => "pms/admin/helpdesk_sub_categories",
        }
    }

    /// Key under which list payloads nest the records.
    pub fn collection_key(&self) -> &'static str {
        match self {
            Self::Tickets => "complaints",
            Self::Inventory => "inventories",
            Self::PurchaseOrders => "purchase_orders",
            Self::Bookings => "facility_bookings",
            Self::PatrolRoutes => "patrollings",
            Self::RosterTemplates => "user_roasters",
            Self::Visitors => "visitors",
            Self::Permits => "permits",
            Self::Buildings => "buildings",
            Self::Wings => "wings",
            Self::Areas => "areas",
            Self::Floors => "floors",
            Self::Rooms => "units",
            Self::Categories => "helpdesk_categories",
            Self::SubCategories => "helpdesk_sub_categories",
        }
    }

    /// Foreign key linking this resource to its parent in a cascade.
    pub fn parent_field(&self) -> Option<&'static str> {
        match self {
            Self::Wings => Some("building_id"),
            Self::Areas => Some("wing_id"),
            Self::Floors => Some("area_id"),
            Self::Rooms => Some("floor_id"),
            Self::SubCategories => Some("category_id"),
            _ => None,
        }
    }

    /// Human-readable name for notices and file names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tickets => "Tickets",
            Self::Inventory => "Inventory",
            Self::PurchaseOrders => "Purchase Orders",
            Self::Bookings => "Bookings",
            Self::PatrolRoutes => "Patrolling",
            Self::RosterTemplates => "Roster Templates",
            Self::Visitors => "Visitors",
            Self::Permits => "Permits",
            Self::Buildings => "Buildings",
            Self::Wings => "Wings",
            Self::Areas => "Areas",
            Self::Floors => "Floors",
            Self::Rooms => "Rooms",
            Self::Categories => "Categories",
            Self::SubCategories => "Subcategories",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_RESOURCES
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown resource '{s}'. Must be one of: {}",
                    ALL_RESOURCES
                        .iter()
                        .map(Resource::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}
