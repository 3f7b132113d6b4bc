//! Registry of national geophysics and remote-sensing coverages served over
//! WCS from the NCI THREDDS servers.

/// A named coverage layer and the WCS endpoint serving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub layer: &'static str,
    pub url: &'static str,
}

/// A group of endpoints sharing a theme and an output subfolder.
#[derive(Debug, Clone, Copy)]
pub struct ThemeGroup {
    pub theme: &'static str,
    /// Subfolder (relative to the stamp root) the layers are written into.
    pub subdir: &'static str,
    pub endpoints: &'static [Endpoint],
}

pub const GRAVITY: &[Endpoint] = &[
    Endpoint {
        layer: "isostatic_residual_gravity_anomaly",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/onshore_geodetic_Isostatic_Residual_v2_2016/onshore_geodetic_Isostatic_Residual_v2_2016.nc",
    },
    Endpoint {
        layer: "bouger_gravity_anomaly",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/onshore_geodetic_Complete_Bouguer_2016/onshore_geodetic_Complete_Bouguer_2016.nc",
    },
];

pub const MAGNETICS: &[Endpoint] = &[
    Endpoint {
        layer: "variable_reduction_to_pole",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/magmap_v6_2015_VRTP/magmap_v6_2015_VRTP.nc",
    },
    Endpoint {
        layer: "total_magnetic_intensity",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/magmap_v6_2015/magmap_v6_2015.nc",
    },
];

pub const RADIOMETRICS: &[Endpoint] = &[
    Endpoint {
        layer: "filtered_terrestrial_dose",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/radmap_v3_2015_filtered_dose/radmap_v3_2015_filtered_dose.nc",
    },
    Endpoint {
        layer: "filtered_potassium_pct",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/radmap_v3_2015_filtered_pctk/radmap_v3_2015_filtered_pctk.nc",
    },
    Endpoint {
        layer: "filtered_thorium_ppm",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/radmap_v3_2015_filtered_ppmth/radmap_v3_2015_filtered_ppmth.nc",
    },
    Endpoint {
        layer: "filtered_uranium_ppm",
        url: "http://dap-wms.nci.org.au/thredds/wcs/rr2/geophysics/radmap_v3_2015_filtered_ppmu/radmap_v3_2015_filtered_ppmu.nc",
    },
];

// A couple of the mainland ASTER mosaics (FeOH group content, MgOH group
// composition) are broken upstream and are left out here.
pub const ASTER: &[Endpoint] = &[
    Endpoint {
        layer: "aloh_group_composition",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_AlOH_group_composition_reprojected.nc4",
    },
    Endpoint {
        layer: "aloh_group_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_AlOH_group_content_reprojected.nc4",
    },
    Endpoint {
        layer: "ferrous_iron_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_Ferrous_Iron_Index_reprojected.nc4",
    },
    Endpoint {
        layer: "ferrous_iron_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_Ferrous_iron_content_in_MgOH_reprojected.nc4",
    },
    Endpoint {
        layer: "ferric_oxide_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_Ferric_oxide_content_reprojected.nc4",
    },
    Endpoint {
        layer: "opaque_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_Opaque_Index_reprojected.nc4",
    },
    Endpoint {
        layer: "kaolin_group_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_Kaolin_group_index_reprojected.nc4",
    },
    Endpoint {
        layer: "mgoh_group_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Aus_Mainland/Aus_Mainland_MgOH_group_content_reprojected.nc4",
    },
    Endpoint {
        layer: "tir_quartz_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/thermal/Aus_ASTER_L2EM_Quartz_Index_reprojected.nc4",
    },
    Endpoint {
        layer: "thermal_infrared_gypsum_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/thermal/Aus_ASTER_L2EM_Gypsum_Index_reprojected.nc4",
    },
    Endpoint {
        layer: "thermal_infrared_silica_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/thermal/Aus_ASTER_L2EM_Silica_Index_reprojected.nc4",
    },
];

// Tasmania has its own ASTER mosaics on a separate grid. They are not part
// of the default themes; Tasmanian stamps fetch them explicitly. The same
// two broken mosaics as the mainland are left out.
pub const ASTER_TAS: &[Endpoint] = &[
    Endpoint {
        layer: "aloh_group_composition",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_AlOH_Group_composition_reprojected.nc4",
    },
    Endpoint {
        layer: "aloh_group_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_AlOH_group_content_reprojected.nc4",
    },
    Endpoint {
        layer: "ferrous_iron_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_Ferrous_Iron_index_reprojected.nc4",
    },
    Endpoint {
        layer: "ferrous_iron_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_Ferrous_iron_in_MgOH_content_reprojected.nc4",
    },
    Endpoint {
        layer: "ferric_oxide_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_Ferric_Oxide_content_reprojected.nc4",
    },
    Endpoint {
        layer: "opaque_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_Opaque_index_reprojected.nc4",
    },
    Endpoint {
        layer: "kaolin_group_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_Kaolin_group_index_reprojected.nc4",
    },
    Endpoint {
        layer: "mgoh_group_content",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/vnir/Tasmania/Tas_MgOH_group_content_reprojected.nc4",
    },
    Endpoint {
        layer: "tir_quartz_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/thermal/Aus_ASTER_L2EM_Quartz_Index_reprojected.nc4",
    },
    Endpoint {
        layer: "thermal_infrared_gypsum_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/thermal/Aus_ASTER_L2EM_Gypsum_Index_reprojected.nc4",
    },
    Endpoint {
        layer: "thermal_infrared_silica_index",
        url: "http://dap-wms.nci.org.au/thredds/wcs/wx7/aster/thermal/Aus_ASTER_L2EM_Silica_Index_reprojected.nc4",
    },
];

/// All coverage groups, with the subfolder each is written into.
pub const THEMES: &[ThemeGroup] = &[
    ThemeGroup {
        theme: "gravity",
        subdir: "geophysics/gravity",
        endpoints: GRAVITY,
    },
    ThemeGroup {
        theme: "magnetics",
        subdir: "geophysics/magnetics",
        endpoints: MAGNETICS,
    },
    ThemeGroup {
        theme: "radiometrics",
        subdir: "geophysics/radiometrics",
        endpoints: RADIOMETRICS,
    },
    ThemeGroup {
        theme: "aster",
        subdir: "remote_sensing/aster",
        endpoints: ASTER,
    },
];

/// Total number of registered coverages across all themes.
pub fn total_coverages() -> usize {
    THEMES.iter().map(|group| group.endpoints.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_total_coverages() {
        assert_eq!(
            total_coverages(),
            GRAVITY.len() + MAGNETICS.len() + RADIOMETRICS.len() + ASTER.len()
        );
    }

    #[test]
    fn test_layers_unique_within_theme() {
        for group in THEMES {
            let names: HashSet<_> = group.endpoints.iter().map(|e| e.layer).collect();
            assert_eq!(names.len(), group.endpoints.len(), "{}", group.theme);
        }
    }

    #[test]
    fn test_tasmania_mirrors_mainland_layers() {
        // Same products as the mainland set, different mosaics
        let mainland: HashSet<_> = ASTER.iter().map(|e| e.layer).collect();
        let tasmania: HashSet<_> = ASTER_TAS.iter().map(|e| e.layer).collect();
        assert_eq!(mainland, tasmania);
        for endpoint in ASTER_TAS {
            assert!(
                endpoint.url.contains("Tasmania") || endpoint.url.contains("thermal"),
                "{}",
                endpoint.layer
            );
        }
        // Tasmania is not in the default fetch set
        assert!(THEMES
            .iter()
            .all(|group| !std::ptr::eq(group.endpoints, ASTER_TAS)));
    }

    #[test]
    fn test_urls_are_wcs_endpoints() {
        for group in THEMES {
            for endpoint in group.endpoints {
                assert!(endpoint.url.starts_with("http"), "{}", endpoint.layer);
                assert!(endpoint.url.contains("/wcs/"), "{}", endpoint.layer);
            }
        }
    }
}
